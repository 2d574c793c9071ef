use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use polynest::error::NestError;

use crate::dispatch::{DispatchError, Runner, WorkerBackend};

/// Interval at which a waiting batch checks for cancellation
const CANCEL_POLL: Duration = Duration::from_millis(20);

struct Task {
    index: usize,
    buf: Vec<u8>,
    reply: Sender<Reply>,
}

enum Reply {
    Started(usize),
    Done(usize, Result<Vec<u8>, NestError>),
}

/// Long-lived worker threads pulling jobs from one shared channel.
pub struct DedicatedBackend {
    tasks: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
}

impl DedicatedBackend {
    pub fn new(n_workers: usize, runner: Runner, cancel: Arc<AtomicBool>) -> Result<Self, DispatchError> {
        let (tx, rx) = channel::unbounded::<Task>();
        let workers = (0..n_workers)
            .map(|i| {
                let rx = rx.clone();
                let cancel = cancel.clone();
                std::thread::Builder::new()
                    .name(format!("worker-{i}"))
                    .spawn(move || worker_loop(rx, runner, cancel))
                    .map_err(|e| DispatchError::Backend(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("[DISPATCH] {n_workers} dedicated workers started");
        Ok(DedicatedBackend {
            tasks: Some(tx),
            workers,
            cancel,
        })
    }
}

fn worker_loop(tasks: Receiver<Task>, runner: Runner, cancel: Arc<AtomicBool>) {
    for task in tasks.iter() {
        if cancel.load(Ordering::Relaxed) {
            continue;
        }
        // a closed reply channel means the batch was abandoned
        if task.reply.send(Reply::Started(task.index)).is_err() {
            continue;
        }
        let result = runner(&task.buf);
        let _ = task.reply.send(Reply::Done(task.index, result));
    }
}

impl WorkerBackend for DedicatedBackend {
    fn run_batch(&self, jobs: Vec<Vec<u8>>, on_spawn: &(dyn Fn(usize) + Sync)) -> Result<Vec<Vec<u8>>, DispatchError> {
        let tasks = self.tasks.as_ref().ok_or(DispatchError::Cancelled)?;
        let n = jobs.len();
        let (reply_tx, reply_rx) = channel::unbounded();
        for (index, buf) in jobs.into_iter().enumerate() {
            let task = Task {
                index,
                buf,
                reply: reply_tx.clone(),
            };
            tasks
                .send(task)
                .map_err(|_| DispatchError::Backend("worker channel closed".into()))?;
        }
        drop(reply_tx);

        let mut results: Vec<Option<Vec<u8>>> = vec![None; n];
        let mut done = 0;
        while done < n {
            match reply_rx.recv_timeout(CANCEL_POLL) {
                Ok(Reply::Started(index)) => on_spawn(index),
                Ok(Reply::Done(index, Ok(buf))) => {
                    results[index] = Some(buf);
                    done += 1;
                }
                Ok(Reply::Done(index, Err(source))) => {
                    self.cancel.store(true, Ordering::Relaxed);
                    return Err(DispatchError::Worker { index, source });
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.cancel.load(Ordering::Relaxed) {
                        return Err(DispatchError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(match self.cancel.load(Ordering::Relaxed) {
                        true => DispatchError::Cancelled,
                        false => DispatchError::Backend("workers stopped before the batch completed".into()),
                    });
                }
            }
        }
        Ok(results.into_iter().flatten().collect())
    }

    fn n_workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for DedicatedBackend {
    fn drop(&mut self) {
        // closing the channel ends every worker loop
        self.tasks.take();
        for w in self.workers.drain(..) {
            if w.join().is_err() {
                warn!("[DISPATCH] a worker thread panicked");
            }
        }
    }
}
