use anyhow::{Context, Result, anyhow, ensure};
use crossbeam::channel::{Receiver, Sender, unbounded};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::JoinHandle;

use super::core::{Backend, Batch, WorkerPool, plan_batches};
use crate::workload::{Checksum, Workload};

/// Something a worker thread uses to turn a batch into checksums.
///
/// The thread backend computes locally; the process backend forwards the batch
/// to a child process.
pub trait BatchExecutor: Send + 'static {
    fn execute(&mut self, batch: &Batch) -> Result<Vec<Checksum>>;

    /// Release whatever the executor owns once the work channel closes
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Reply sent from a worker thread back to the collector
struct Reply {
    start: usize,
    len: usize,
    outcome: Result<Vec<Checksum>>,
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<E> {
    worker_id: usize,
    work_rx: Receiver<Batch>,
    reply_tx: Sender<Reply>,
    executor: E,
}

/// Worker pool where long-lived threads pull batches from a shared channel
pub struct ChannelPool {
    backend: Backend,
    workers: usize,
    work_tx: Option<Sender<Batch>>,
    reply_rx: Receiver<Reply>,
    handles: Vec<JoinHandle<Result<()>>>,
}

impl ChannelPool {
    /// Spawn `workers` threads, each owning the executor built for its id
    pub fn spawn<E, F>(
        backend: Backend,
        workers: usize,
        mut make_executor: F,
    ) -> Result<Self>
    where
        E: BatchExecutor,
        F: FnMut(usize) -> Result<E>,
    {
        ensure!(workers >= 1, "worker count must be at least 1");

        let (work_tx, work_rx) = unbounded::<Batch>();
        let (reply_tx, reply_rx) = unbounded::<Reply>();

        let mut pool = Self {
            backend,
            workers,
            work_tx: Some(work_tx),
            reply_rx,
            handles: Vec::with_capacity(workers),
        };

        for worker_id in 0..workers {
            // on failure `pool` is dropped, which closes and joins earlier workers
            let executor = make_executor(worker_id)
                .with_context(|| format!("Failed to start {backend} worker {worker_id}"))?;
            let ctx = WorkerContext {
                worker_id,
                work_rx: work_rx.clone(),
                reply_tx: reply_tx.clone(),
                executor,
            };

            let handle = std::thread::Builder::new()
                .name(format!("batchbench-{backend}-{worker_id}"))
                .spawn(move || worker_thread(ctx))
                .context("Failed to spawn worker thread")?;
            pool.handles.push(handle);
        }

        Ok(pool)
    }

    fn collect(&mut self, expected_batches: usize, job_count: usize) -> Result<Vec<Checksum>> {
        let mut slots: Vec<Option<Checksum>> = vec![None; job_count];

        for _ in 0..expected_batches {
            let reply = self
                .reply_rx
                .recv()
                .map_err(|_| anyhow!("All workers exited before the run completed"))?;
            let results = reply
                .outcome
                .with_context(|| format!("Batch starting at job {} failed", reply.start))?;
            ensure!(
                results.len() == reply.len,
                "Batch starting at job {} returned {} results for {} jobs",
                reply.start,
                results.len(),
                reply.len
            );

            for (offset, checksum) in results.into_iter().enumerate() {
                let index = reply.start + offset;
                let slot = slots
                    .get_mut(index)
                    .with_context(|| format!("Worker returned out-of-range job {index}"))?;
                ensure!(slot.is_none(), "Job {index} was reported twice");
                *slot = Some(checksum);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.with_context(|| format!("Job {index} produced no result")))
            .collect()
    }

    fn close_and_join(&mut self) -> Result<()> {
        // closing the work channel lets every worker loop finish
        self.work_tx = None;

        let mut first_error = None;
        for handle in self.handles.drain(..) {
            let outcome = handle
                .join()
                .map_err(|_| anyhow!("Worker thread panicked during shutdown"))
                .and_then(|result| result);
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn worker_thread<E: BatchExecutor>(mut ctx: WorkerContext<E>) -> Result<()> {
    while let Ok(batch) = ctx.work_rx.recv() {
        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.executor.execute(&batch)))
            .unwrap_or_else(|_| {
                Err(anyhow!(
                    "Worker {} panicked while running jobs {:?}",
                    ctx.worker_id,
                    batch.indices()
                ))
            });

        let reply = Reply {
            start: batch.start,
            len: batch.len,
            outcome,
        };
        if ctx.reply_tx.send(reply).is_err() {
            break; // Pool dropped
        }
    }

    tracing::trace!("Worker {} finished", ctx.worker_id);
    ctx.executor.close()
}

impl WorkerPool for ChannelPool {
    fn backend(&self) -> Backend {
        self.backend
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
        ensure!(batch_size >= 1, "batch size must be at least 1");
        let work_tx = self
            .work_tx
            .as_ref()
            .context("Worker pool is closed")?;

        let batches = plan_batches(*workload, job_count, batch_size);
        let expected = batches.len();
        for batch in batches {
            work_tx
                .send(batch)
                .map_err(|_| anyhow!("All workers exited before accepting work"))?;
        }

        let collected = self.collect(expected, job_count);
        if collected.is_err() {
            // queued work may still be in flight; this handle is no longer usable
            self.work_tx = None;
        }
        collected
    }

    fn shutdown(mut self: Box<Self>) -> Result<()> {
        self.close_and_join()
    }
}

impl Drop for ChannelPool {
    fn drop(&mut self) {
        if !self.handles.is_empty()
            && let Err(e) = self.close_and_join()
        {
            tracing::debug!("Worker pool shutdown on drop failed: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadKind;

    struct Doubler;

    impl BatchExecutor for Doubler {
        fn execute(&mut self, batch: &Batch) -> Result<Vec<Checksum>> {
            Ok(batch.indices().map(|i| Checksum::Xor(i as u64 * 2)).collect())
        }
    }

    struct Exploder;

    impl BatchExecutor for Exploder {
        fn execute(&mut self, batch: &Batch) -> Result<Vec<Checksum>> {
            if batch.indices().contains(&7) {
                panic!("boom");
            }
            Ok(batch.indices().map(|_| Checksum::Xor(0)).collect())
        }
    }

    /// Reports every job twice
    struct Stutter;

    impl BatchExecutor for Stutter {
        fn execute(&mut self, batch: &Batch) -> Result<Vec<Checksum>> {
            Ok(batch.indices().chain(batch.indices()).map(|_| Checksum::Xor(1)).collect())
        }
    }

    fn workload() -> Workload {
        Workload::new(WorkloadKind::Spin, 4)
    }

    #[test]
    fn test_results_in_index_order() {
        let mut pool = ChannelPool::spawn(Backend::Threads, 3, |_| Ok(Doubler)).unwrap();
        let results = pool.run(&workload(), 20, 3).unwrap();
        let expected: Vec<_> = (0..20).map(|i| Checksum::Xor(i * 2)).collect();
        assert_eq!(results, expected);
        Box::new(pool).shutdown().unwrap();
    }

    #[test]
    fn test_pool_is_reusable_after_success() {
        let mut pool = ChannelPool::spawn(Backend::Threads, 2, |_| Ok(Doubler)).unwrap();
        assert_eq!(pool.run(&workload(), 5, 1).unwrap().len(), 5);
        assert_eq!(pool.run(&workload(), 9, 4).unwrap().len(), 9);
        assert_eq!(pool.workers(), 2);
    }

    #[test]
    fn test_panicking_job_becomes_error() {
        let mut pool = ChannelPool::spawn(Backend::Threads, 2, |_| Ok(Exploder)).unwrap();
        let err = pool.run(&workload(), 16, 2).unwrap_err();
        assert!(format!("{err:#}").contains("panicked"));

        // the failed handle refuses further work
        assert!(pool.run(&workload(), 4, 1).is_err());
    }

    #[test]
    fn test_wrong_result_count_is_rejected() {
        let mut pool = ChannelPool::spawn(Backend::Threads, 1, |_| Ok(Stutter)).unwrap();
        let err = pool.run(&workload(), 4, 2).unwrap_err();
        assert!(err.to_string().contains("returned 4 results for 2 jobs"));
    }

    #[test]
    fn test_executor_construction_failure() {
        let result = ChannelPool::spawn(Backend::Threads, 3, |id| {
            if id == 2 {
                Err(anyhow!("no more executors"))
            } else {
                Ok(Doubler)
            }
        });
        let err = result.err().unwrap();
        assert!(err.to_string().contains("worker 2"));
    }

    #[test]
    fn test_zero_jobs_returns_empty() {
        let mut pool = ChannelPool::spawn(Backend::Threads, 2, |_| Ok(Doubler)).unwrap();
        assert!(pool.run(&workload(), 0, 8).unwrap().is_empty());
    }
}
