use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use super::profile::HostProfile;
use crate::workload::{Checksum, Workload};

/// Contiguous run of job indices dispatched to a worker as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub workload: Workload,
    pub start: usize,
    pub len: usize,
}

impl Batch {
    pub fn indices(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Execute every job of the batch on the calling thread
    pub fn execute(&self) -> Result<Vec<Checksum>> {
        self.indices()
            .map(|index| {
                self.workload
                    .run(index)
                    .with_context(|| format!("job {index} failed"))
            })
            .collect()
    }
}

/// Split `0..job_count` into batches of `batch_size` (last one may be shorter)
pub fn plan_batches(workload: Workload, job_count: usize, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    (0..job_count)
        .step_by(batch_size)
        .map(|start| Batch {
            workload,
            start,
            len: batch_size.min(job_count - start),
        })
        .collect()
}

/// Clamp a requested batch size so that no worker is starved.
///
/// ```text
/// cap       = max(1, ceil(job_count / workers))
/// effective = clamp(requested, 1, cap)
/// ```
///
/// # Examples
/// ```rust
/// use batchbench::parallel::effective_batch_size;
///
/// assert_eq!(effective_batch_size(100, 4, 25), 25);
/// assert_eq!(effective_batch_size(100, 4, 64), 25);
/// assert_eq!(effective_batch_size(100, 4, 0), 1);
/// assert_eq!(effective_batch_size(0, 4, 16), 1);
/// ```
pub fn effective_batch_size(job_count: usize, workers: usize, requested: usize) -> usize {
    let cap = job_count.div_ceil(workers.max(1)).max(1);
    requested.clamp(1, cap)
}

/// Calculate workers from available cores and configuration limits
///
/// # Algorithm
/// ```text
/// 1. Detect available CPU cores
/// 2. Apply percentage: cores * thread_percentage / 100
/// 3. Apply config limit: min(max_threads, percentage_result) if max_threads > 0
/// 4. Ensure minimum: max(1, final_result)
/// ```
pub fn calculate_optimal_workers(max_threads: usize, thread_percentage: u8) -> usize {
    let available_cores = HostProfile::logical_cpus();

    let workers_by_percentage =
        std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

    if max_threads > 0 {
        std::cmp::min(max_threads, workers_by_percentage)
    } else {
        workers_by_percentage
    }
}

/// Resolve the worker count for a sweep.
///
/// An explicit request is bounded by the host's available parallelism; without
/// one the count comes from `thread_percentage` and `max_threads`.
pub fn resolve_workers(
    requested: Option<usize>,
    max_threads: usize,
    thread_percentage: u8,
) -> Result<usize> {
    match requested {
        Some(requested) => {
            ensure!(requested >= 1, "worker count must be at least 1, got {requested}");
            let available = HostProfile::logical_cpus();
            if requested > available {
                tracing::warn!(
                    "Requested {} workers but only {} CPUs are available; using {}",
                    requested,
                    available,
                    available
                );
            }
            Ok(requested.min(available))
        }
        None => {
            ensure!(
                (1..=100).contains(&thread_percentage),
                "thread_percentage must be between 1 and 100, got {thread_percentage}"
            );
            Ok(calculate_optimal_workers(max_threads, thread_percentage))
        }
    }
}

/// Execution backend of a worker pool
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Worker threads fed through crossbeam channels
    #[default]
    Threads,
    /// A dedicated rayon thread pool per run
    Rayon,
    /// Worker processes speaking JSON lines over stdin/stdout
    Process,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Threads => f.write_str("threads"),
            Backend::Rayon => f.write_str("rayon"),
            Backend::Process => f.write_str("process"),
        }
    }
}

/// A live, explicitly managed set of workers.
///
/// Handles are created by [`PoolConfig::spawn`] and closed with
/// [`WorkerPool::shutdown`]. A failed run leaves the handle unusable.
pub trait WorkerPool {
    fn backend(&self) -> Backend;

    /// Number of workers owned by this handle
    fn workers(&self) -> usize;

    /// Run jobs `0..job_count` in batches of `batch_size` and return the
    /// per-job checksums in job-index order.
    fn run(
        &mut self,
        workload: &Workload,
        job_count: usize,
        batch_size: usize,
    ) -> Result<Vec<Checksum>>;

    /// Stop the workers and wait for them to exit
    fn shutdown(self: Box<Self>) -> Result<()>;
}

/// Everything needed to build a worker pool; the worker count is a plain field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolConfig {
    pub backend: Backend,
    pub workers: usize,
    /// Executable re-launched as `<program> worker` by the process backend
    /// (defaults to the current executable)
    pub program: Option<PathBuf>,
}

impl PoolConfig {
    pub fn new(backend: Backend, workers: usize) -> Self {
        Self {
            backend,
            workers,
            program: None,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start a fresh pool
    pub fn spawn(&self) -> Result<Box<dyn WorkerPool>> {
        ensure!(self.workers >= 1, "worker count must be at least 1");
        tracing::debug!("Spawning {} pool with {} workers", self.backend, self.workers);

        Ok(match self.backend {
            Backend::Threads => Box::new(super::threads::spawn(self.workers)?),
            Backend::Rayon => Box::new(super::rayon_pool::RayonPool::new(self.workers)?),
            Backend::Process => {
                let program = match &self.program {
                    Some(program) => program.clone(),
                    None => std::env::current_exe()
                        .context("Failed to locate the current executable for worker processes")?,
                };
                Box::new(super::process::spawn(&program, self.workers)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadKind;

    #[test]
    fn test_effective_batch_size_clamps() {
        assert_eq!(effective_batch_size(100, 4, 1), 1);
        assert_eq!(effective_batch_size(100, 4, 25), 25);
        assert_eq!(effective_batch_size(100, 4, 1024), 25);
        assert_eq!(effective_batch_size(101, 4, 1024), 26);
        assert_eq!(effective_batch_size(3, 8, 16), 1);
        assert_eq!(effective_batch_size(10, 3, 0), 1);
    }

    #[test]
    fn test_effective_batch_size_never_starves_workers() {
        for job_count in 1..200 {
            for workers in 1..9 {
                for requested in [0, 1, 2, 7, 64, 1024] {
                    let batch = effective_batch_size(job_count, workers, requested);
                    assert!(batch >= 1);
                    assert!(batch <= job_count.div_ceil(workers));
                    assert!(batch <= requested.max(1));
                }
            }
        }
    }

    #[test]
    fn test_plan_batches_covers_every_index_once() {
        let workload = Workload::new(WorkloadKind::Spin, 10);
        let batches = plan_batches(workload, 10, 4);
        let lens: Vec<_> = batches.iter().map(|b| b.len).collect();
        assert_eq!(lens, vec![4, 4, 2]);

        let indices: Vec<usize> = batches.iter().flat_map(|b| b.indices()).collect();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_plan_batches_empty() {
        let workload = Workload::new(WorkloadKind::Spin, 10);
        assert!(plan_batches(workload, 0, 4).is_empty());
    }

    #[test]
    fn test_calculate_optimal_workers() {
        let workers = calculate_optimal_workers(0, 100);
        assert_eq!(workers, HostProfile::logical_cpus());

        let workers = calculate_optimal_workers(1, 100);
        assert_eq!(workers, 1);

        let workers = calculate_optimal_workers(0, 1);
        assert!(workers >= 1);
    }

    #[test]
    fn test_resolve_workers() {
        assert_eq!(resolve_workers(Some(1), 0, 100).unwrap(), 1);
        assert!(resolve_workers(Some(0), 0, 100).is_err());
        assert!(resolve_workers(None, 0, 0).is_err());

        let capped = resolve_workers(Some(usize::MAX), 0, 100).unwrap();
        assert_eq!(capped, HostProfile::logical_cpus());
    }

    #[test]
    fn test_pool_config_exposes_worker_count() {
        let config = PoolConfig::new(Backend::Threads, 3);
        assert_eq!(config.workers(), 3);
        assert!(PoolConfig::new(Backend::Threads, 0).spawn().is_err());
    }
}
