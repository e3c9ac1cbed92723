/// Scan events — lightweight messages sent from the scan thread to the
/// foreground via a crossbeam channel, in emission order.
use std::path::PathBuf;

/// Parameters of one scan run. Immutable once created.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub root_path: PathBuf,
    /// How many levels below the root to descend. Lazy per-level expansion
    /// uses 2 so the UI can draw expansion arrows one level ahead.
    pub max_depth: usize,
}

/// Why a subtree scan failed. Maps directly onto OS error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFailure {
    /// The caller lacks read permission for the path.
    AccessDenied,
    /// The path does not exist or is not a directory.
    PathInvalid,
    /// The entry-count or recursion-depth guard tripped.
    ResourceLimitExceeded,
    /// Any other OS-level failure.
    UnexpectedOs,
}

impl ScanFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanFailure::AccessDenied => "access denied",
            ScanFailure::PathInvalid => "path invalid",
            ScanFailure::ResourceLimitExceeded => "resource limit exceeded",
            ScanFailure::UnexpectedOs => "unexpected OS error",
        }
    }

    pub(crate) fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScanFailure::AccessDenied,
            std::io::ErrorKind::NotFound => ScanFailure::PathInvalid,
            _ => ScanFailure::UnexpectedOs,
        }
    }
}

/// Events emitted by the scan worker.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// `path` was listed; `children` are its accepted subdirectories,
    /// sorted by path.
    NodeDiscovered {
        path: PathBuf,
        children: Vec<PathBuf>,
    },
    /// Scanning `path` failed. Non-fatal: the scan continues with sibling
    /// subtrees.
    ScanFailed {
        path: PathBuf,
        reason: ScanFailure,
        message: String,
    },
    /// Terminal event of every scan run, emitted exactly once — on success,
    /// on error, and after cancellation.
    Completed,
}
