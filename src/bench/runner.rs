use anyhow::{Context, Result, ensure};
use std::time::{Duration, Instant};

use crate::parallel::{PoolConfig, effective_batch_size};
use crate::workload::{Checksum, Workload};

/// Outcome of one timed configuration run
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub job_count: usize,
    pub length: usize,
    pub requested_batch: usize,
    /// Batch size actually dispatched after clamping
    pub batch_size: usize,
    pub elapsed: Duration,
    pub checksum: Checksum,
}

/// Run `job_count` jobs once on a freshly spawned pool.
///
/// The clock covers pool start-up, the batched map and shutdown, so every
/// configuration pays its own warm-up. With no jobs nothing is spawned.
pub fn run_once(
    pool: &PoolConfig,
    workload: &Workload,
    job_count: usize,
    requested_batch: usize,
) -> Result<Measurement> {
    let batch_size = effective_batch_size(job_count, pool.workers(), requested_batch);

    if job_count == 0 {
        return Ok(Measurement {
            job_count,
            length: workload.cost,
            requested_batch,
            batch_size,
            elapsed: Duration::ZERO,
            checksum: workload.identity(),
        });
    }

    workload.validate()?;

    let started = Instant::now();
    let mut handle = pool.spawn()?;
    let results = handle.run(workload, job_count, batch_size);
    // tear the pool down even when the run failed
    let shutdown = handle.shutdown();
    let results = results.with_context(|| {
        format!("Run with {job_count} jobs and batch size {batch_size} failed")
    })?;
    shutdown.context("Worker pool did not shut down cleanly")?;
    let elapsed = started.elapsed();

    ensure!(
        results.len() == job_count,
        "Expected {job_count} results, collected {}",
        results.len()
    );
    let checksum = Checksum::fold(workload.kind, results)?;

    tracing::trace!(
        "n_jobs={} length={} batch={} elapsed={:?} checksum={}",
        job_count,
        workload.cost,
        batch_size,
        elapsed,
        checksum
    );

    Ok(Measurement {
        job_count,
        length: workload.cost,
        requested_batch,
        batch_size,
        elapsed,
        checksum,
    })
}
