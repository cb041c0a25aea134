use anyhow::Result;

use super::core::{Backend, Batch};
use super::pool::{BatchExecutor, ChannelPool};
use crate::workload::Checksum;

/// Runs batches on the worker thread itself
pub struct LocalExecutor;

impl BatchExecutor for LocalExecutor {
    fn execute(&mut self, batch: &Batch) -> Result<Vec<Checksum>> {
        batch.execute()
    }
}

/// Spawn a thread-backed pool with `workers` threads
pub fn spawn(workers: usize) -> Result<ChannelPool> {
    ChannelPool::spawn(Backend::Threads, workers, |_| Ok(LocalExecutor))
}
