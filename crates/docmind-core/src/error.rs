/// Caller-facing errors for the folder-tree subsystem.
///
/// Per-node scan failures are deliberately *not* represented here — they
/// travel through the event channel as [`crate::scanner::ScanEvent::ScanFailed`]
/// so that one unreadable directory never aborts a whole scan.
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    /// The requested scan root does not exist or is not a directory.
    /// Surfaced synchronously, before any worker thread is spawned.
    #[error("path does not exist or is not a directory: {0}")]
    PathInvalid(PathBuf),

    /// The scan worker did not terminate within the bounded shutdown wait.
    /// Logged by the supervisor; never returned to callers and never fatal
    /// to a subsequent `start_scan`.
    #[error("scan worker failed to terminate within {0:?}")]
    ShutdownTimeout(Duration),
}
