use serde::{Deserialize, Serialize};
use std::fmt;

use super::WorkloadKind;

/// Scalar reduction of a job's result.
///
/// Each workload kind has its own reduction: z-score checksums are summed,
/// spin checksums are XOR-folded. Both reductions are commutative, and the runner
/// folds them in job-index order, so floating point sums stay bit-identical
/// whatever batch size was used to produce them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Checksum {
    Sum(f64),
    Xor(u64),
}

impl Checksum {
    /// Identity element of the reduction used by `kind`
    pub fn identity(kind: WorkloadKind) -> Self {
        match kind {
            WorkloadKind::ZScore => Checksum::Sum(0.0),
            WorkloadKind::Spin => Checksum::Xor(0),
        }
    }

    /// Combine two checksums of the same kind.
    ///
    /// Mixing kinds is a programming error upstream; it is reported rather than
    /// silently coerced.
    pub fn combine(self, other: Checksum) -> anyhow::Result<Checksum> {
        match (self, other) {
            (Checksum::Sum(a), Checksum::Sum(b)) => Ok(Checksum::Sum(a + b)),
            (Checksum::Xor(a), Checksum::Xor(b)) => Ok(Checksum::Xor(a ^ b)),
            (a, b) => anyhow::bail!("cannot combine checksums of different kinds: {a} and {b}"),
        }
    }

    /// Fold per-job checksums in the given order
    pub fn fold<I>(kind: WorkloadKind, checksums: I) -> anyhow::Result<Checksum>
    where
        I: IntoIterator<Item = Checksum>,
    {
        checksums
            .into_iter()
            .try_fold(Checksum::identity(kind), Checksum::combine)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checksum::Sum(value) => write!(f, "{value:.6}"),
            Checksum::Xor(value) => write!(f, "{value}"),
        }
    }
}
