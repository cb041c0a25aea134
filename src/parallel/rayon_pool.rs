use anyhow::{Context, Result, anyhow, ensure};
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};

use super::core::{Backend, WorkerPool};
use crate::workload::{Checksum, Workload};

/// A dedicated rayon pool, built per handle rather than using the global one
pub struct RayonPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl RayonPool {
    pub fn new(workers: usize) -> Result<Self> {
        ensure!(workers >= 1, "worker count must be at least 1");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("batchbench-rayon-{index}"))
            .build()
            .context("Failed to build rayon thread pool")?;
        Ok(Self { pool, workers })
    }

    /// Run `job` for every index in `0..job_count`, one rayon task per chunk.
    ///
    /// A panicking chunk becomes an error for the whole run.
    fn run_jobs<F>(&self, job_count: usize, batch_size: usize, job: F) -> Result<Vec<Checksum>>
    where
        F: Fn(usize) -> Result<Checksum> + Sync,
    {
        ensure!(batch_size >= 1, "batch size must be at least 1");
        let indices: Vec<usize> = (0..job_count).collect();

        // par_chunks keeps chunk order, so the flattened output is in index order
        let batches: Vec<Vec<Checksum>> = self.pool.install(|| {
            indices
                .par_chunks(batch_size)
                .map(|chunk| {
                    let run_chunk = || {
                        chunk
                            .iter()
                            .map(|&index| job(index).with_context(|| format!("job {index} failed")))
                            .collect::<Result<Vec<_>>>()
                    };
                    catch_unwind(AssertUnwindSafe(run_chunk)).unwrap_or_else(|_| {
                        let start = chunk.first().copied().unwrap_or_default();
                        Err(anyhow!(
                            "Rayon worker panicked while running jobs {:?}",
                            start..start + chunk.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(batches.into_iter().flatten().collect())
    }
}

impl WorkerPool for RayonPool {
    fn backend(&self) -> Backend {
        Backend::Rayon
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn run(
        &mut self,
        workload: &Workload,
        job_count: usize,
        batch_size: usize,
    ) -> Result<Vec<Checksum>> {
        self.run_jobs(job_count, batch_size, |index| workload.run(index))
    }

    fn shutdown(self: Box<Self>) -> Result<()> {
        // dropping the pool terminates its threads
        drop(self.pool);
        Ok(())
    }
}
