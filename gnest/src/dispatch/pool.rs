use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::dispatch::{DispatchError, Runner, WorkerBackend};

/// Runs jobs on a shared rayon thread pool.
pub struct PoolBackend {
    pool: ThreadPool,
    runner: Runner,
    cancel: Arc<AtomicBool>,
}

impl PoolBackend {
    pub fn new(n_workers: usize, runner: Runner, cancel: Arc<AtomicBool>) -> Result<Self, DispatchError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .thread_name(|i| format!("pool-{i}"))
            .build()
            .map_err(|e| DispatchError::Backend(e.to_string()))?;
        debug!("[DISPATCH] rayon pool with {n_workers} threads");
        Ok(PoolBackend { pool, runner, cancel })
    }
}

impl WorkerBackend for PoolBackend {
    fn run_batch(&self, jobs: Vec<Vec<u8>>, on_spawn: &(dyn Fn(usize) + Sync)) -> Result<Vec<Vec<u8>>, DispatchError> {
        let runner = self.runner;
        let cancel = &self.cancel;
        self.pool.install(|| {
            jobs.par_iter()
                .enumerate()
                .map(|(index, buf)| {
                    if cancel.load(Ordering::Relaxed) {
                        return Err(DispatchError::Cancelled);
                    }
                    on_spawn(index);
                    runner(buf).map_err(|source| {
                        // the rest of the batch is discarded
                        cancel.store(true, Ordering::Relaxed);
                        DispatchError::Worker { index, source }
                    })
                })
                .collect()
        })
    }

    fn n_workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}
