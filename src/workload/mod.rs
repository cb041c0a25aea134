//! Synthetic CPU-bound workloads
//!
//! Every job is identified only by its index. The worker regenerates its input
//! from `(cost, index)` instead of receiving data, which keeps dispatch traffic
//! tiny so the measurement isolates per-batch scheduling overhead.
//!
//! Two kinds are available:
//!
//! - **zscore**: generate a pseudo-random series of `cost` points, normalize it and
//!   return the sum of absolute z-scores.
//! - **spin**: a tight integer loop of `cost` iterations, XOR-ed with the job index.

mod checksum;

pub use checksum::Checksum;

use anyhow::{Result, ensure};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default multiplier turning a job index into a series seed
pub const DEFAULT_SEED_STRIDE: u64 = 1_315_423_911;

/// Which synthetic kernel a job runs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    /// Pseudo-random series normalized to z-scores (float checksum, summed)
    #[default]
    #[value(name = "zscore")]
    ZScore,
    /// Integer spin loop (integer checksum, XOR-folded)
    #[value(name = "spin")]
    Spin,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::ZScore => f.write_str("zscore"),
            WorkloadKind::Spin => f.write_str("spin"),
        }
    }
}

/// Per-item description of the work a single job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub kind: WorkloadKind,
    /// Series length for `zscore`, loop iterations for `spin`
    pub cost: usize,
    pub seed_stride: u64,
}

impl Workload {
    pub fn new(kind: WorkloadKind, cost: usize) -> Self {
        Self {
            kind,
            cost,
            seed_stride: DEFAULT_SEED_STRIDE,
        }
    }

    pub fn with_seed_stride(mut self, seed_stride: u64) -> Self {
        self.seed_stride = seed_stride;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.cost >= 1,
            "workload cost (series length) must be at least 1, got {}",
            self.cost
        );
        Ok(())
    }

    /// Seed of the series generated for job `index`
    pub fn seed_for(&self, index: usize) -> u64 {
        (index as u64).wrapping_mul(self.seed_stride)
    }

    /// Run job `index` and return its checksum
    pub fn run(&self, index: usize) -> Result<Checksum> {
        match self.kind {
            WorkloadKind::ZScore => {
                zscore_checksum(self.cost, self.seed_for(index)).map(Checksum::Sum)
            }
            WorkloadKind::Spin => {
                self.validate()?;
                Ok(Checksum::Xor(spin_checksum(self.cost, index)))
            }
        }
    }

    pub fn identity(&self) -> Checksum {
        Checksum::identity(self.kind)
    }
}

/// Deterministic pseudo-random series: standard normal noise plus a small
/// periodic offset.
pub fn generate_series(length: usize, seed: u64) -> Result<Vec<f64>> {
    ensure!(length >= 1, "series length must be at least 1, got {length}");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok((0..length)
        .map(|i| {
            let noise: f64 = rng.sample(StandardNormal);
            noise + 0.01 * (i % 10) as f64
        })
        .collect())
}

/// Z-score pass over a generated series, reduced to the sum of absolute z-scores
pub fn zscore_checksum(length: usize, seed: u64) -> Result<f64> {
    let series = generate_series(length, seed)?;
    let n = series.len() as f64;

    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let sd = if variance > 0.0 { variance.sqrt() } else { 1.0 };

    Ok(series.iter().map(|x| ((x - mean) / sd).abs()).sum())
}

/// Tiny integer loop that burns a few microseconds per job
pub fn spin_checksum(iterations: usize, index: usize) -> u64 {
    let mut acc: u64 = 0;
    for i in 1..iterations as u64 {
        acc = acc.wrapping_add(std::hint::black_box(i.wrapping_mul(i)) % 97);
    }
    acc ^ index as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_is_deterministic() {
        let a = generate_series(256, 42).unwrap();
        let b = generate_series(256, 42).unwrap();
        assert_eq!(a.len(), 256);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_zscore_checksum_bit_identical() {
        let first = zscore_checksum(1000, 1_315_423_911).unwrap();
        for _ in 0..3 {
            let again = zscore_checksum(1000, 1_315_423_911).unwrap();
            assert_eq!(first.to_bits(), again.to_bits());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = zscore_checksum(500, 1).unwrap();
        let b = zscore_checksum(500, 2).unwrap();
        assert_ne!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_zero_length_fails_fast() {
        let err = zscore_checksum(0, 7).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
        assert!(Workload::new(WorkloadKind::Spin, 0).run(3).is_err());
    }

    #[test]
    fn test_single_point_has_zero_checksum() {
        // one point: variance is zero, sd falls back to 1, |x - mean| is 0
        assert_eq!(zscore_checksum(1, 99).unwrap(), 0.0);
    }

    #[test]
    fn test_zscore_checksum_bounds() {
        // sum of |z| is at most sqrt(n) * n^(1/2) = n by Cauchy-Schwarz
        let n = 400;
        let value = zscore_checksum(n, 5).unwrap();
        assert!(value > 0.0);
        assert!(value <= n as f64 + 1e-9);
    }

    #[test]
    fn test_spin_checksum_known_values() {
        assert_eq!(spin_checksum(1, 0), 0);
        assert_eq!(spin_checksum(1, 5), 5);
        // i = 1, 2: 1 + 4
        assert_eq!(spin_checksum(3, 0), 5);
        // i = 1..=10: 1+4+9+16+25+36+49+64+81+(100 % 97 = 3)
        assert_eq!(spin_checksum(11, 0), 288);
        assert_eq!(spin_checksum(11, 1), 289);
    }

    #[test]
    fn test_seed_for_wraps() {
        let workload = Workload::new(WorkloadKind::ZScore, 10).with_seed_stride(u64::MAX);
        assert_eq!(workload.seed_for(0), 0);
        assert_eq!(workload.seed_for(2), u64::MAX.wrapping_mul(2));
    }

    #[test]
    fn test_run_dispatches_by_kind() {
        let zscore = Workload::new(WorkloadKind::ZScore, 64);
        assert!(matches!(zscore.run(3).unwrap(), Checksum::Sum(_)));

        let spin = Workload::new(WorkloadKind::Spin, 3);
        assert_eq!(spin.run(1).unwrap(), Checksum::Xor(4));
    }
}
