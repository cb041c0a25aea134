use anyhow::{Result, ensure};
use serde::Serialize;

use crate::config::BenchConfig;
use crate::parallel::{Backend, PoolConfig, resolve_workers};
use crate::workload::{Workload, WorkloadKind};

/// Values given on the command line; `None` falls back to configuration
#[derive(Debug, Clone, Default)]
pub struct SweepOverrides {
    pub njobs: Option<Vec<usize>>,
    pub lengths: Option<Vec<usize>>,
    pub batch_sizes: Option<Vec<usize>>,
    pub workers: Option<usize>,
    pub repeats: Option<usize>,
    pub quick: bool,
    pub workload: Option<WorkloadKind>,
    pub backend: Option<Backend>,
    pub seed_stride: Option<u64>,
}

/// A fully resolved and validated sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepPlan {
    pub job_counts: Vec<usize>,
    pub lengths: Vec<usize>,
    pub batch_sizes: Vec<usize>,
    pub repeats: usize,
    pub workload_kind: WorkloadKind,
    pub seed_stride: u64,
    pub pool: PoolConfig,
}

impl SweepPlan {
    pub fn resolve(config: &BenchConfig, overrides: &SweepOverrides) -> Result<Self> {
        let sweep = &config.sweep;

        let batch_sizes = match &overrides.batch_sizes {
            Some(sizes) => sizes.clone(),
            None if overrides.quick => sweep.quick_batch_sizes.clone(),
            None => sweep.batch_sizes.clone(),
        };

        let requested_workers = overrides
            .workers
            .or((config.pool.workers > 0).then_some(config.pool.workers));
        let workers = resolve_workers(
            requested_workers,
            config.pool.max_threads,
            config.pool.thread_percentage,
        )?;
        let backend = overrides.backend.unwrap_or(config.pool.backend);

        let plan = Self {
            job_counts: overrides.njobs.clone().unwrap_or_else(|| sweep.njobs.clone()),
            lengths: overrides.lengths.clone().unwrap_or_else(|| sweep.lengths.clone()),
            batch_sizes,
            repeats: overrides.repeats.unwrap_or(sweep.repeats),
            workload_kind: overrides.workload.unwrap_or(config.workload.kind),
            seed_stride: overrides.seed_stride.unwrap_or(config.workload.seed_stride),
            pool: PoolConfig::new(backend, workers),
        };
        plan.validate()?;

        tracing::debug!(
            "Resolved sweep: {} job counts x {} lengths x {} batch sizes, {} repeats, {} {} workers",
            plan.job_counts.len(),
            plan.lengths.len(),
            plan.batch_sizes.len(),
            plan.repeats,
            plan.pool.workers,
            plan.pool.backend
        );
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.job_counts.is_empty(), "At least one job count is required");
        ensure!(!self.lengths.is_empty(), "At least one length is required");
        ensure!(!self.batch_sizes.is_empty(), "At least one batch size is required");
        ensure!(
            self.repeats >= 1,
            "repeats must be at least 1, got {}",
            self.repeats
        );
        ensure!(self.pool.workers >= 1, "worker count must be at least 1");

        if let Some(length) = self.lengths.iter().find(|&&length| length == 0) {
            anyhow::bail!("lengths must be at least 1, got {length}");
        }
        if let Some(size) = self.batch_sizes.iter().find(|&&size| size == 0) {
            anyhow::bail!("batch sizes must be at least 1, got {size}");
        }
        Ok(())
    }

    /// Workload for one `length` group
    pub fn workload(&self, length: usize) -> Workload {
        Workload::new(self.workload_kind, length).with_seed_stride(self.seed_stride)
    }

    /// (job count, length) pairs in sweep order
    pub fn groups(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.job_counts
            .iter()
            .flat_map(|&n| self.lengths.iter().map(move |&length| (n, length)))
    }

    /// Number of timed runs: one baseline plus every batch size, per group
    pub fn total_runs(&self) -> usize {
        self.job_counts.len() * self.lengths.len() * (self.batch_sizes.len() + 1) * self.repeats
    }
}
