//! # batchbench - batch-size sweeps for parallel worker pools
//!
//! Dispatching jobs to a worker pool one at a time pays the scheduling cost per
//! job; dispatching them in large batches risks leaving workers idle. batchbench
//! measures that tradeoff: it runs a synthetic CPU-bound workload on a fixed pool
//! while sweeping the batch size, and reports the fastest batch size for every
//! (job count, work per job) combination.
//!
//! ## Features
//!
//! - **Deterministic workloads**: seeded z-score series or integer spin loops
//! - **Three pool backends**: crossbeam-fed threads, a rayon pool, or worker processes
//! - **Fair measurements**: a fresh pool per run, repeated runs, median timings
//! - **Layered configuration**: embedded defaults, `batchbench.toml`, `BATCHBENCH_*` env
//!
//! ## Quick Start
//!
//! ```bash
//! # Small grid, 3 repeats per configuration
//! batchbench run --quick --njobs 100 1000 --lengths 500 --repeats 3
//!
//! # Same sweep on worker processes, as JSON
//! batchbench run --quick --backend process --format json
//!
//! # Which pool would be used on this machine?
//! batchbench profile
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use batchbench::bench::{SweepOverrides, SweepPlan, SweepReport, run_sweep};
//! use batchbench::config::BenchConfig;
//!
//! let config = BenchConfig::load()?;
//! let overrides = SweepOverrides { quick: true, ..Default::default() };
//! let plan = SweepPlan::resolve(&config, &overrides)?;
//!
//! let groups = run_sweep(&plan, |_| {})?;
//! println!("{}", SweepReport::new(&plan, groups).render_text()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod bench;
pub mod cli;
pub mod config;
pub mod parallel;
pub mod workload;

pub use cli::{Cli, Output};
pub use config::BenchConfig;

/// Result type alias for batchbench operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
