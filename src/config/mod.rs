//! Configuration management for batchbench
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. embedded `default-config.toml`
//! 2. `./batchbench.toml`, or the file passed with `--config` (TOML or JSON)
//! 3. `BATCHBENCH_*` environment variables, `__` separating sections
//!
//! Command-line flags are applied on top by the sweep planner.

mod core;

pub use self::core::{BenchConfig, DEFAULT_CONFIG, ENV_PREFIX, PROJECT_CONFIG_FILE};

use serde::{Deserialize, Serialize};

use crate::parallel::Backend;
use crate::workload::WorkloadKind;

/// Sweep grids and repetition count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Job counts to test
    pub njobs: Vec<usize>,
    /// Cost parameters (points per series) to test
    pub lengths: Vec<usize>,
    /// Full batch-size grid
    pub batch_sizes: Vec<usize>,
    /// Smaller grid used with `--quick`
    pub quick_batch_sizes: Vec<usize>,
    /// Repetitions per configuration
    pub repeats: usize,
}

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    pub backend: Backend,
    /// Explicit worker count (0 = auto)
    pub workers: usize,
    /// Upper bound for the automatic worker count (0 = no limit)
    pub max_threads: usize,
    /// Percentage of CPU cores used by the automatic worker count
    pub thread_percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSettings {
    pub kind: WorkloadKind,
    pub seed_stride: u64,
}
