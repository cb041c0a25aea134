//! Worker pools for batched job execution
//!
//! This module owns everything about **how** jobs get executed: sizing the pool,
//! splitting jobs into batches, dispatching them to workers and collecting the
//! results back in job order.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores via a cached [`HostProfile`]
//! - **Pool Sizing**: Resolves explicit or percentage-based worker counts
//! - **Batch Clamping**: Caps batch sizes so no worker is starved
//! - **Execution**: Threads, rayon or worker processes behind one [`WorkerPool`] trait
//!
//! ## What This Module Does NOT Do:
//! - **Timing**: Measuring wall-clock time is the bench runner's job
//! - **Sweeping**: Parameter grids, repeats and medians live in `bench`
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Bench         │    │   PoolConfig     │    │   WorkerPool    │
//! │   Runner        │───▶│                  │───▶│                 │
//! │                 │    │ • backend        │    │ • threads       │
//! │ • job count     │    │ • workers        │    │ • rayon         │
//! │ • batch size    │    │ • program        │    │ • process       │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use batchbench::parallel::{Backend, PoolConfig, effective_batch_size};
//! use batchbench::workload::{Workload, WorkloadKind};
//!
//! let config = PoolConfig::new(Backend::Threads, 2);
//! let workload = Workload::new(WorkloadKind::Spin, 100);
//! let batch_size = effective_batch_size(10, config.workers(), 64);
//!
//! let mut pool = config.spawn()?;
//! let checksums = pool.run(&workload, 10, batch_size)?;
//! pool.shutdown()?;
//! assert_eq!(checksums.len(), 10);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod core;
pub mod pool;
pub mod process;
pub mod profile;
pub mod rayon_pool;
pub mod threads;

// Re-export main types for easier access
pub use self::core::{
    Backend, Batch, PoolConfig, WorkerPool, calculate_optimal_workers, effective_batch_size,
    plan_batches, resolve_workers,
};
pub use profile::HostProfile;
