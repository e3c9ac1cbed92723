/// Recursive directory walker — runs on the supervisor's background thread.
///
/// The walk is depth-first and sequential. Blocking filesystem calls are the
/// only suspension points; cancellation is cooperative via a stop flag
/// checked before each recursive descent and before each per-entry
/// filesystem call, so cancellation latency is bounded by the duration of
/// the current listing, not by an external timeout.
use super::events::{ScanEvent, ScanFailure, ScanRequest};
use crossbeam_channel::Sender;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Maximum number of entries a directory may contain before its subtree is
/// abandoned with `ResourceLimitExceeded`. Protects the registry — and the
/// widget rendering it — from pathological directories.
pub const MAX_DIR_ENTRIES: usize = 10_000;

/// Hard recursion ceiling, independent of the per-request `max_depth`.
/// Defends against filesystem cycles and misconfigured requests.
pub const MAX_SCAN_DEPTH: usize = 5;

pub struct DirectoryScanWorker {
    request: ScanRequest,
    stop: Arc<AtomicBool>,
    events: Sender<ScanEvent>,
}

impl DirectoryScanWorker {
    pub fn new(request: ScanRequest, stop: Arc<AtomicBool>, events: Sender<ScanEvent>) -> Self {
        Self {
            request,
            stop,
            events,
        }
    }

    /// Walk the tree and emit events. Always ends with exactly one
    /// [`ScanEvent::Completed`] — on success, after a failure, or after
    /// observing the stop flag. `walk` converts every failure into an event,
    /// so no error can escape past the final emit.
    pub fn run(self) {
        debug!(
            "scan worker starting at {} (max depth {})",
            self.request.root_path.display(),
            self.request.max_depth
        );
        let root = self.request.root_path.clone();
        self.walk(&root, 0);
        self.emit(ScanEvent::Completed);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Send an event. A disconnected channel means the supervisor abandoned
    /// this scan; treat it as a stop request so the walk unwinds at the next
    /// checkpoint.
    fn emit(&self, event: ScanEvent) {
        if self.events.send(event).is_err() {
            self.stop.store(true, Ordering::Relaxed);
        }
    }

    fn emit_failed(&self, path: &Path, reason: ScanFailure, message: String) {
        self.emit(ScanEvent::ScanFailed {
            path: path.to_path_buf(),
            reason,
            message,
        });
    }

    fn walk(&self, path: &Path, depth: usize) {
        if self.stopped() {
            return;
        }

        if depth > MAX_SCAN_DEPTH {
            self.emit_failed(
                path,
                ScanFailure::ResourceLimitExceeded,
                format!("directory nesting exceeds {MAX_SCAN_DEPTH} levels"),
            );
            return;
        }

        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                self.emit_failed(path, ScanFailure::PathInvalid, "not a directory".into());
                return;
            }
            Err(err) => {
                self.emit_failed(path, ScanFailure::from_io(&err), err.to_string());
                return;
            }
        }

        let entries = match fs::read_dir(path) {
            Ok(iter) => iter,
            Err(err) => {
                self.emit_failed(path, ScanFailure::from_io(&err), err.to_string());
                return;
            }
        };

        // Count and classify in one pass; abandon the subtree as soon as the
        // entry count crosses the guard.
        let mut children: Vec<PathBuf> = Vec::new();
        let mut entry_count = 0usize;
        for entry in entries {
            if self.stopped() {
                return;
            }
            entry_count += 1;
            if entry_count > MAX_DIR_ENTRIES {
                self.emit_failed(
                    path,
                    ScanFailure::ResourceLimitExceeded,
                    format!("directory contains more than {MAX_DIR_ENTRIES} entries"),
                );
                return;
            }
            // A fault on one entry skips that entry, never the listing.
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if let Some(child) = self.classify(&entry) {
                children.push(child);
            }
        }
        children.sort_unstable();

        self.emit(ScanEvent::NodeDiscovered {
            path: path.to_path_buf(),
            children: children.clone(),
        });

        if depth >= self.request.max_depth {
            return;
        }

        // Validate every child before descending into any of them, so
        // unreadable siblings are reported ahead of the recursion.
        let mut readable = Vec::with_capacity(children.len());
        for child in children {
            if self.stopped() {
                return;
            }
            match fs::read_dir(&child) {
                Ok(_) => readable.push(child),
                Err(err) => self.emit_failed(&child, ScanFailure::from_io(&err), err.to_string()),
            }
        }

        for child in readable {
            if self.stopped() {
                return;
            }
            self.walk(&child, depth + 1);
        }
    }

    /// Decide whether one directory entry belongs in the result set.
    ///
    /// Accepts plain subdirectories and symbolic links that resolve to a
    /// real directory. Dot-named entries and unresolvable links are excluded
    /// silently; an OS error on the entry skips it without failing the
    /// parent listing.
    fn classify(&self, entry: &fs::DirEntry) -> Option<PathBuf> {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            return None;
        }

        let path = entry.path();
        let file_type = entry.file_type().ok()?;
        if file_type.is_dir() {
            return Some(path);
        }
        if file_type.is_symlink() {
            let target = fs::canonicalize(&path).ok()?;
            if target.is_dir() {
                return Some(path);
            }
        }
        None
    }
}
