//! Bounded-concurrency execution of worker jobs.
//!
//! Jobs cross the worker boundary as encoded buffers only, so workers share no mutable state with the
//! orchestrating thread. Results come back in the order the jobs were submitted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::{debug, info};
use thiserror::Error;
use thousands::Separable;

use polynest::error::NestError;

use crate::config::Backend;

mod dedicated;
mod job;
mod pool;

#[doc(inline)]
pub use dedicated::DedicatedBackend;
#[doc(inline)]
pub use job::{Job, JobOutput, run_encoded};
#[doc(inline)]
pub use pool::PoolBackend;

/// Function a worker applies to every encoded job
pub type Runner = fn(&[u8]) -> polynest::error::Result<Vec<u8>>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("batch cancelled")]
    Cancelled,
    #[error("job {index} failed: {source}")]
    Worker {
        index: usize,
        #[source]
        source: NestError,
    },
    #[error("worker backend failure: {0}")]
    Backend(String),
    #[error("malformed job output: {0}")]
    Output(#[from] NestError),
}

/// Executes a batch of encoded jobs on some set of workers.
pub trait WorkerBackend: Send {
    /// Runs every job once and returns the outputs positionally.
    /// `on_spawn` is called with the job index whenever a worker picks a job up.
    fn run_batch(&self, jobs: Vec<Vec<u8>>, on_spawn: &(dyn Fn(usize) + Sync)) -> Result<Vec<Vec<u8>>, DispatchError>;

    fn n_workers(&self) -> usize;
}

/// Builds the backend of the given kind.
pub fn create_backend(
    kind: Backend,
    n_workers: usize,
    runner: Runner,
    cancel: Arc<AtomicBool>,
) -> Result<Box<dyn WorkerBackend>, DispatchError> {
    Ok(match kind {
        Backend::Pool => Box::new(PoolBackend::new(n_workers, runner, cancel)?),
        Backend::Dedicated => Box::new(DedicatedBackend::new(n_workers, runner, cancel)?),
    })
}

pub struct WorkDispatcher {
    backend: Box<dyn WorkerBackend>,
    kind: Backend,
    n_workers: usize,
    runner: Runner,
    cancel: Arc<AtomicBool>,
}

impl WorkDispatcher {
    pub fn new(kind: Backend, n_workers: usize) -> Result<Self, DispatchError> {
        Self::with_runner(kind, n_workers, run_encoded)
    }

    pub fn with_runner(kind: Backend, n_workers: usize, runner: Runner) -> Result<Self, DispatchError> {
        let n_workers = n_workers.max(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let backend = create_backend(kind, n_workers, runner, cancel.clone())?;
        info!("[DISPATCH] {kind:?} backend with {n_workers} workers");
        Ok(WorkDispatcher {
            backend,
            kind,
            n_workers,
            runner,
            cancel,
        })
    }

    pub fn n_workers(&self) -> usize {
        self.backend.n_workers()
    }

    /// Flag that aborts the running batch once set, shareable with other threads.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Replaces every worker with a fresh one and clears the cancellation flag.
    pub fn restart(&mut self) -> Result<(), DispatchError> {
        self.cancel.store(false, Ordering::Relaxed);
        self.backend = create_backend(self.kind, self.n_workers, self.runner, self.cancel.clone())?;
        debug!("[DISPATCH] workers restarted");
        Ok(())
    }

    /// Runs raw buffers, outputs in submission order.
    pub fn run_encoded(&self, jobs: Vec<Vec<u8>>, on_spawn: &(dyn Fn(usize) + Sync)) -> Result<Vec<Vec<u8>>, DispatchError> {
        if jobs.is_empty() {
            return Ok(vec![]);
        }
        if self.is_stopped() {
            return Err(DispatchError::Cancelled);
        }
        let bytes: usize = jobs.iter().map(Vec::len).sum();
        debug!(
            "[DISPATCH] batch of {} jobs, {} bytes",
            jobs.len(),
            bytes.separate_with_commas()
        );
        self.backend.run_batch(jobs, on_spawn)
    }

    pub fn run(&self, jobs: &[Job], on_spawn: &(dyn Fn(usize) + Sync)) -> Result<Vec<JobOutput>, DispatchError> {
        let kinds = jobs.iter().map(Job::kind).collect::<Vec<_>>();
        let bufs = jobs.iter().map(Job::encode).collect::<polynest::error::Result<Vec<_>>>()?;
        let outputs = self.run_encoded(bufs, on_spawn)?;
        kinds
            .into_iter()
            .zip(outputs)
            .map(|(kind, buf)| JobOutput::decode(kind, &buf).map_err(DispatchError::from))
            .collect()
    }

    /// Submits one aggregate job to a single worker.
    pub fn run_single(&self, job: &Job, on_spawn: &(dyn Fn(usize) + Sync)) -> Result<JobOutput, DispatchError> {
        self.run(std::slice::from_ref(job), on_spawn)?
            .pop()
            .ok_or_else(|| DispatchError::Backend("empty output for a single job".into()))
    }
}

/// Counts spawned jobs of a batch and reports the fraction to `progress`.
pub fn spawn_counter(total: usize, progress: &(dyn Fn(f64) + Sync)) -> impl Fn(usize) + Sync + '_ {
    let spawned = AtomicUsize::new(0);
    move |_| {
        let n = spawned.fetch_add(1, Ordering::Relaxed) + 1;
        progress(n as f64 / total.max(1) as f64);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use test_case::test_case;

    use polynest::cache::NfpKey;
    use polynest::entities::PolygonNode;
    use polynest::geometry::Polygon;
    use polynest::nfp::{PairJob, PairResult};
    use polynest::util::PackedConfig;

    use super::*;

    /// Echoes its input, the first job after a delay so that later jobs finish before it
    fn slow_first(buf: &[u8]) -> polynest::error::Result<Vec<u8>> {
        if buf.first() == Some(&0) {
            std::thread::sleep(Duration::from_millis(100));
        }
        Ok(buf.to_vec())
    }

    fn failing(buf: &[u8]) -> polynest::error::Result<Vec<u8>> {
        match buf.first() {
            Some(&3) => Err(NestError::Worker("boom".into())),
            _ => Ok(buf.to_vec()),
        }
    }

    /// Answers every job with an NFP too large for the pair format
    fn oversized_nfp(_: &[u8]) -> polynest::error::Result<Vec<u8>> {
        let coords = (0..40_000).flat_map(|i| [i as f64, 0.5 * i as f64]).collect();
        JobOutput::Pair(PairResult {
            key: NfpKey::new(0, 1, false, 0, 0),
            loops: vec![Polygon::new(coords)],
        })
        .encode()
    }

    fn pair_job(i: i32) -> Job {
        Job::Pair(PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(-1, i, true, 0, 0),
            a: PolygonNode::new(-1, 0.0, Polygon::rectangle(0.0, 0.0, 100.0, 100.0)),
            b: PolygonNode::new(i, 0.0, Polygon::rectangle(0.0, 0.0, 10.0 * (i + 1) as f64, 10.0)),
        })
    }

    #[test_case(Backend::Pool; "pool")]
    #[test_case(Backend::Dedicated; "dedicated")]
    fn results_keep_submission_order(backend: Backend) {
        let dispatcher = WorkDispatcher::with_runner(backend, 2, slow_first).unwrap();
        let finished = Mutex::new(vec![]);
        let jobs: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i, 42]).collect();
        let out = dispatcher
            .run_encoded(jobs.clone(), &|i| finished.lock().unwrap().push(i))
            .unwrap();
        assert_eq!(out, jobs);
        // progress fires once per spawned job
        let mut spawned = finished.into_inner().unwrap();
        spawned.sort();
        assert_eq!(spawned, vec![0, 1, 2, 3, 4]);
    }

    #[test_case(Backend::Pool; "pool")]
    #[test_case(Backend::Dedicated; "dedicated")]
    fn pair_batch_completes(backend: Backend) {
        let dispatcher = WorkDispatcher::new(backend, 2).unwrap();
        let jobs = (0..5).map(pair_job).collect::<Vec<_>>();
        let outputs = dispatcher.run(&jobs, &|_| {}).unwrap();
        assert_eq!(outputs.len(), 5);
        for (i, out) in outputs.iter().enumerate() {
            match out {
                JobOutput::Pair(r) => {
                    assert_eq!(r.key, NfpKey::new(-1, i as i32, true, 0, 0));
                    assert_eq!(r.loops.len(), 1);
                }
                JobOutput::Placement(_) => panic!("pair job produced a placement"),
            }
        }
    }

    #[test_case(Backend::Pool; "pool")]
    #[test_case(Backend::Dedicated; "dedicated")]
    fn worker_failure_stops_the_batch(backend: Backend) {
        let mut dispatcher = WorkDispatcher::with_runner(backend, 2, failing).unwrap();
        let jobs: Vec<Vec<u8>> = (0..6u8).map(|i| vec![i]).collect();
        let err = dispatcher.run_encoded(jobs.clone(), &|_| {}).unwrap_err();
        assert!(matches!(err, DispatchError::Worker { index: 3, .. } | DispatchError::Cancelled));
        assert!(dispatcher.is_stopped());

        dispatcher.restart().unwrap();
        assert!(!dispatcher.is_stopped());
        let ok: Vec<Vec<u8>> = (4..6u8).map(|i| vec![i]).collect();
        assert_eq!(dispatcher.run_encoded(ok.clone(), &|_| {}).unwrap(), ok);
    }

    #[test]
    fn stopped_dispatcher_refuses_work() {
        let dispatcher = WorkDispatcher::new(Backend::Pool, 1).unwrap();
        assert!(dispatcher.run_encoded(vec![], &|_| {}).unwrap().is_empty());
        dispatcher.stop();
        assert!(matches!(
            dispatcher.run_encoded(vec![vec![0]], &|_| {}),
            Err(DispatchError::Cancelled)
        ));
    }

    #[test]
    fn unknown_job_kind_surfaces_as_worker_error() {
        let dispatcher = WorkDispatcher::new(Backend::Dedicated, 1).unwrap();
        let err = dispatcher.run_encoded(vec![9u32.to_le_bytes().to_vec()], &|_| {}).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Worker {
                source: NestError::UnknownJobKind(9),
                ..
            }
        ));
    }

    #[test_case(Backend::Pool; "pool")]
    #[test_case(Backend::Dedicated; "dedicated")]
    fn unencodable_output_fails_the_job(backend: Backend) {
        let dispatcher = WorkDispatcher::with_runner(backend, 2, oversized_nfp).unwrap();
        let err = dispatcher.run_encoded(vec![vec![0]], &|_| {}).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Worker {
                index: 0,
                source: NestError::WireFormat(_),
            }
        ));
    }
}
