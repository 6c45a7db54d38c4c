//! Background world builds with single-swap publication.
#![forbid(unsafe_code)]

mod shared;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use tessera_partition::{BuildOptions, OrganizedWorld, organize};
use tessera_tiles::TileStore;

pub use shared::SharedWorld;

pub struct BuildJob {
    pub rev: u64,
    pub store: TileStore,
    pub options: BuildOptions,
}

pub struct BuildOutput {
    pub rev: u64,
    pub world: OrganizedWorld,
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("no build finished within the timeout")]
    Timeout,
    #[error("build rev {rev} failed: {reason}")]
    Failed { rev: u64, reason: String },
    #[error("build worker has stopped")]
    WorkerStopped,
}

type BuildResult = Result<BuildOutput, WaitError>;

/// Owns one worker thread that runs build passes in submission order.
///
/// Each build runs to completion; there is no cancellation. Results come
/// back through [`WorldBuilder::drain_results`] or are published straight
/// into a [`SharedWorld`] by [`WorldBuilder::publish_ready`].
pub struct WorldBuilder {
    job_tx: Option<Sender<BuildJob>>,
    res_rx: Receiver<BuildResult>,
    next_rev: AtomicU64,
    queued: Arc<AtomicUsize>,
    worker: Option<JoinHandle<()>>,
}

impl WorldBuilder {
    pub fn new() -> std::io::Result<Self> {
        let (job_tx, job_rx) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<BuildResult>();
        let queued = Arc::new(AtomicUsize::new(0));
        let worker = {
            let queued = queued.clone();
            thread::Builder::new()
                .name("tessera-build".into())
                .spawn(move || worker_loop(job_rx, res_tx, queued))?
        };
        Ok(Self {
            job_tx: Some(job_tx),
            res_rx,
            next_rev: AtomicU64::new(1),
            queued,
            worker: Some(worker),
        })
    }

    /// Queues a build of `store` and returns its revision. Revisions increase
    /// with each submission.
    pub fn submit(&self, store: TileStore, options: BuildOptions) -> u64 {
        let rev = self.next_rev.fetch_add(1, Ordering::Relaxed);
        self.queued.fetch_add(1, Ordering::Relaxed);
        let sent = self
            .job_tx
            .as_ref()
            .is_some_and(|tx| tx.send(BuildJob { rev, store, options }).is_ok());
        if !sent {
            self.queued.fetch_sub(1, Ordering::Relaxed);
            log::warn!(target: "runtime", "build worker gone; rev {} not queued", rev);
        }
        rev
    }

    /// Builds submitted but not yet finished.
    pub fn pending(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// Finished builds, oldest first. Failed builds are logged and skipped.
    pub fn drain_results(&self) -> Vec<BuildOutput> {
        self.res_rx
            .try_iter()
            .filter_map(|res| match res {
                Ok(out) => Some(out),
                Err(e) => {
                    log::error!(target: "runtime", "{}", e);
                    None
                }
            })
            .collect()
    }

    /// Blocks up to `timeout` for the next finished build. A build that
    /// panicked comes back as [`WaitError::Failed`].
    pub fn wait_result(&self, timeout: Duration) -> Result<BuildOutput, WaitError> {
        match self.res_rx.recv_timeout(timeout) {
            Ok(res) => res,
            Err(RecvTimeoutError::Timeout) => Err(WaitError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(WaitError::WorkerStopped),
        }
    }

    /// False once the worker thread has exited.
    pub fn is_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Publishes every finished build into `shared`, oldest first. Results
    /// older than what `shared` already holds are dropped. Returns how many
    /// were published.
    pub fn publish_ready(&self, shared: &SharedWorld) -> usize {
        let mut published = 0;
        for out in self.drain_results() {
            if shared.publish(out.rev, out.world) {
                published += 1;
            }
        }
        published
    }
}

impl Drop for WorldBuilder {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.job_tx.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::warn!(target: "runtime", "build worker panicked");
            }
        }
    }
}

fn worker_loop(rx: Receiver<BuildJob>, tx: Sender<BuildResult>, queued: Arc<AtomicUsize>) {
    while let Ok(job) = rx.recv() {
        let rev = job.rev;
        log::debug!(target: "runtime", "build rev {} started ({} tiles)", rev, job.store.len());
        let res = panic::catch_unwind(AssertUnwindSafe(|| organize(job.store, &job.options)))
            .map(|world| BuildOutput { rev, world })
            .map_err(|payload| WaitError::Failed {
                rev,
                reason: panic_reason(payload.as_ref()),
            });
        queued.fetch_sub(1, Ordering::Relaxed);
        if tx.send(res).is_err() {
            break;
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "build panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_partition::PartitionOptions;
    use tessera_tiles::{Geometry, Hint, TilePos};

    fn row(len: i32) -> TileStore {
        let mut store = TileStore::new(1.0);
        for x in 0..len {
            store.touch(x, 0, 0).geometry = Geometry::Full;
        }
        store.register_hint(Hint::spawn(TilePos::new(0, 0, 0), 0));
        store
    }

    #[test]
    fn background_build_round_trip() {
        let builder = WorldBuilder::new().expect("spawn worker");
        let rev = builder.submit(row(32), BuildOptions::default());
        let out = builder
            .wait_result(Duration::from_secs(10))
            .expect("build finished");
        assert!(builder.is_alive());
        assert_eq!(out.rev, rev);
        assert_eq!(out.world.partitioner.populated_chunks().len(), 2);
        assert_eq!(builder.pending(), 0);
    }

    #[test]
    fn later_revisions_win_publication() {
        let builder = WorldBuilder::new().expect("spawn worker");
        let shared = SharedWorld::new();
        assert!(shared.snapshot().is_none());
        let r1 = builder.submit(row(4), BuildOptions::default());
        let r2 = builder.submit(row(40), BuildOptions::default());
        assert!(r2 > r1);

        let mut outs = Vec::new();
        while outs.len() < 2 {
            outs.push(builder.wait_result(Duration::from_secs(10)).expect("build"));
        }
        // publish newest first; the older one must then be refused
        outs.sort_by_key(|o| std::cmp::Reverse(o.rev));
        for o in outs {
            shared.publish(o.rev, o.world);
        }
        assert_eq!(shared.revision(), r2);
        let snap = shared.snapshot().expect("published");
        assert_eq!(snap.store.len(), 40);
    }

    #[test]
    fn panicking_build_reports_failure_and_worker_survives() {
        let builder = WorldBuilder::new().expect("spawn worker");
        let broken = BuildOptions {
            partition: PartitionOptions { chunk_edge: 0 },
            ..BuildOptions::default()
        };
        let bad = builder.submit(row(8), broken);
        match builder.wait_result(Duration::from_secs(10)) {
            Err(WaitError::Failed { rev, .. }) => assert_eq!(rev, bad),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(out) => panic!("rev {} should have failed", out.rev),
        }
        assert_eq!(builder.pending(), 0);
        assert!(builder.is_alive());

        let good = builder.submit(row(8), BuildOptions::default());
        let out = builder.wait_result(Duration::from_secs(10)).expect("worker still running");
        assert_eq!(out.rev, good);
        assert_eq!(builder.pending(), 0);
    }

    #[test]
    fn idle_wait_times_out() {
        let builder = WorldBuilder::new().expect("spawn worker");
        assert!(matches!(
            builder.wait_result(Duration::from_millis(10)),
            Err(WaitError::Timeout)
        ));
        assert_eq!(builder.pending(), 0);
    }
}
