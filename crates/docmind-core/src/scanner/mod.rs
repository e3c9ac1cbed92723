/// Scanner module — background directory walking with a supervised worker
/// lifecycle.
///
/// A [`ScanSupervisor`] owns at most one `(worker, thread)` pair at a time.
/// Events cross from the scan thread to the foreground through a **bounded
/// crossbeam channel** that preserves emission order; the foreground drains
/// it on its own cadence and is the only place the registry is mutated.
pub mod events;
pub mod worker;

pub use events::{ScanEvent, ScanFailure, ScanRequest};
pub use worker::DirectoryScanWorker;

use crate::error::TreeError;
use crossbeam_channel::Receiver;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Maximum number of scan events that may queue up in the channel.
///
/// One directory level produces one event, so 4 096 queued events give the
/// walker generous headroom. If the foreground falls behind (hidden window,
/// busy frame) the worker blocks briefly on `send` rather than consuming
/// unbounded heap.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

/// How long `cleanup_worker` waits for the worker to stop on its own after
/// the stop flag is raised.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Additional wait once the grace period has expired, before the thread is
/// abandoned for good.
const SHUTDOWN_LAST_CHANCE: Duration = Duration::from_secs(1);

struct ActiveScan {
    root_path: PathBuf,
    stop: Arc<AtomicBool>,
    events: Receiver<ScanEvent>,
    thread: Option<thread::JoinHandle<()>>,
}

/// Owns the single background scan permitted per tree instance.
///
/// The slot holding the current worker is only ever mutated from the
/// foreground (`start_scan` and `cleanup_worker` both run there), so no
/// locking is needed beyond the event channel itself.
#[derive(Default)]
pub struct ScanSupervisor {
    active: Option<ActiveScan>,
}

impl ScanSupervisor {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Start a scan rooted at `root_path`, descending `max_depth` levels.
    ///
    /// Any previous worker is synchronously cleaned up first, enforcing "at
    /// most one concurrent scan". An invalid root is rejected here, before a
    /// thread is spawned and before the running scan (if any) is disturbed.
    pub fn start_scan(&mut self, root_path: &Path, max_depth: usize) -> Result<(), TreeError> {
        let is_dir = fs::metadata(root_path).map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(TreeError::PathInvalid(root_path.to_path_buf()));
        }

        self.cleanup_worker();

        let (tx, rx) = crossbeam_channel::bounded::<ScanEvent>(EVENT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let request = ScanRequest {
            root_path: root_path.to_path_buf(),
            max_depth,
        };
        let worker = DirectoryScanWorker::new(request, Arc::clone(&stop), tx);

        info!(
            "starting scan of {} (max depth {max_depth})",
            root_path.display()
        );
        let handle = thread::Builder::new()
            .name("docmind-scan".into())
            .spawn(move || worker.run())
            .expect("failed to spawn scan thread");

        self.active = Some(ActiveScan {
            root_path: root_path.to_path_buf(),
            stop,
            events: rx,
            thread: Some(handle),
        });
        Ok(())
    }

    /// Request cooperative cancellation of the running scan, if any.
    ///
    /// Non-blocking: the worker exits at its next checkpoint. A blocking
    /// filesystem call already in progress is not interrupted.
    pub fn cancel(&self) {
        if let Some(active) = &self.active {
            active.stop.store(true, Ordering::Relaxed);
        }
    }

    /// Whether a worker is currently assigned and running.
    pub fn is_loading(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.thread.as_ref().is_some_and(|t| !t.is_finished()))
    }

    /// Root path of the scan currently assigned, if any.
    pub fn active_root(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.root_path.as_path())
    }

    /// Pop the next pending event, in emission order (FIFO).
    pub fn try_recv(&self) -> Option<ScanEvent> {
        self.active.as_ref().and_then(|a| a.events.try_recv().ok())
    }

    /// Join a worker that has already finished naturally, releasing the
    /// slot. Called by the foreground once it observes
    /// [`ScanEvent::Completed`]; a no-op while the worker is still running.
    pub fn reap_finished(&mut self) {
        let finished = self
            .active
            .as_ref()
            .is_some_and(|a| a.thread.as_ref().is_none_or(|t| t.is_finished()));
        if !finished {
            return;
        }
        if let Some(mut active) = self.active.take() {
            if let Some(handle) = active.thread.take() {
                let _ = handle.join();
            }
            debug!("scan of {} finished", active.root_path.display());
        }
    }

    /// Shut down any active worker.
    ///
    /// Protocol: raise the stop flag, wait up to [`SHUTDOWN_GRACE`] for the
    /// thread to finish, then one more [`SHUTDOWN_LAST_CHANCE`], then
    /// abandon it. Abandoning detaches the thread and drops the event
    /// channel, so a worker stuck inside a blocking filesystem call exits at
    /// its next emit or stop checkpoint — until then its resources stay
    /// held. Idempotent: with no active worker this is a no-op.
    pub fn cleanup_worker(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        active.stop.store(true, Ordering::Relaxed);

        let Some(handle) = active.thread.take() else {
            return;
        };
        if wait_for_exit(&handle, SHUTDOWN_GRACE) {
            let _ = handle.join();
            debug!("scan worker for {} stopped", active.root_path.display());
            return;
        }

        warn!(
            "scan worker for {} did not stop within {SHUTDOWN_GRACE:?}",
            active.root_path.display()
        );
        if wait_for_exit(&handle, SHUTDOWN_LAST_CHANCE) {
            let _ = handle.join();
            return;
        }

        // Degraded path: the thread is blocked in a filesystem call and
        // cannot be interrupted. Detaching drops the receiver, which turns
        // the worker's next emit into a stop request.
        let err = TreeError::ShutdownTimeout(SHUTDOWN_GRACE + SHUTDOWN_LAST_CHANCE);
        error!("{err}; detaching thread for {}", active.root_path.display());
        drop(handle);
    }
}

impl Drop for ScanSupervisor {
    fn drop(&mut self) {
        self.cleanup_worker();
    }
}

/// Poll `is_finished` until the thread exits or `timeout` elapses.
fn wait_for_exit(handle: &thread::JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    true
}
