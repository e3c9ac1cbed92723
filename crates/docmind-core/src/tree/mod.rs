/// Foreground tree controller — lazy expansion, refresh, and event
/// application.
///
/// Owns the registry and the scan supervisor. All registry mutation happens
/// here, on the foreground, when the caller pumps [`FolderTreeController::process_events`];
/// the scan thread communicates exclusively through the event channel.
use crate::error::TreeError;
use crate::model::TreeNodeRegistry;
use crate::scanner::{ScanEvent, ScanSupervisor};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Depth for root and lazy-expansion scans: the expanded level plus one
/// more, so the UI can draw expansion arrows for grandchildren.
const LAZY_SCAN_DEPTH: usize = 2;

/// Maximum events drained per `process_events` call, so a backlog (e.g.
/// after the window was hidden) never stalls the caller's frame.
pub const MAX_EVENTS_PER_DRAIN: usize = 300;

pub struct FolderTreeController {
    registry: TreeNodeRegistry,
    supervisor: ScanSupervisor,
    /// Paths currently expanded in the presentation layer. Collapse removes
    /// the entry; loaded children stay cached in the registry.
    expanded: HashSet<PathBuf>,
    /// Scans waiting for the single worker slot, in request order. Only
    /// `refresh_all` enqueues more than one at a time.
    pending_scans: VecDeque<PathBuf>,
}

impl Default for FolderTreeController {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderTreeController {
    pub fn new() -> Self {
        Self {
            registry: TreeNodeRegistry::new(),
            supervisor: ScanSupervisor::new(),
            expanded: HashSet::new(),
            pending_scans: VecDeque::new(),
        }
    }

    pub fn registry(&self) -> &TreeNodeRegistry {
        &self.registry
    }

    pub fn expanded_paths(&self) -> &HashSet<PathBuf> {
        &self.expanded
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.contains(path)
    }

    /// Whether a scan is running or queued.
    pub fn is_loading(&self) -> bool {
        self.supervisor.is_loading() || !self.pending_scans.is_empty()
    }

    /// Request cooperative cancellation of the running scan and drop any
    /// queued ones.
    pub fn cancel_scan(&mut self) {
        self.pending_scans.clear();
        self.supervisor.cancel();
    }

    /// Register `root_path` and start its initial scan. Re-adding a tracked
    /// root is a no-op; an invalid path is rejected before any worker is
    /// started.
    pub fn add_root(&mut self, root_path: &Path) -> Result<(), TreeError> {
        if !root_path.is_dir() {
            return Err(TreeError::PathInvalid(root_path.to_path_buf()));
        }
        if !self.registry.register_root(root_path) {
            info!("folder already tracked: {}", root_path.display());
            return Ok(());
        }
        self.expanded.insert(root_path.to_path_buf());
        self.issue_scan(root_path)
    }

    /// The user expanded `path`.
    ///
    /// Issues a scoped scan the first time a node with no loaded children is
    /// expanded. The `children_loaded_once` flag is set *before* the scan
    /// result is known, so repeated expand/collapse cannot double-trigger
    /// even when the scan is slow or fails.
    pub fn handle_expanded(&mut self, path: &Path) -> Result<(), TreeError> {
        self.expanded.insert(path.to_path_buf());
        let needs_scan = self
            .registry
            .node(path)
            .is_some_and(|n| !n.children_loaded_once && n.children.is_empty());
        if needs_scan {
            self.issue_scan(path)
        } else {
            Ok(())
        }
    }

    /// The user collapsed `path`. Loaded children stay cached.
    pub fn handle_collapsed(&mut self, path: &Path) {
        self.expanded.remove(path);
    }

    /// Purge and reload one folder's subtree. The node itself survives; a
    /// new scan is issued only if the node is currently expanded.
    pub fn refresh(&mut self, path: &Path) -> Result<(), TreeError> {
        if !self.registry.contains(path) {
            return Ok(());
        }
        self.registry.purge_subtree(path, true);
        self.expanded
            .retain(|p| p.as_path() == path || !p.starts_with(path));
        self.pending_scans
            .retain(|p| p.as_path() == path || !p.starts_with(path));
        if let Some(node) = self.registry.node_mut(path) {
            node.children_loaded_once = false;
        }
        if self.expanded.contains(path) {
            self.issue_scan(path)
        } else {
            Ok(())
        }
    }

    /// Drop every tracked root and rebuild them in their original
    /// registration order. Root scans run one at a time through the pending
    /// queue, preserving the supervisor's exclusivity guarantee.
    pub fn refresh_all(&mut self) {
        let roots: Vec<PathBuf> = self.registry.roots().to_vec();
        self.supervisor.cleanup_worker();
        self.registry.clear();
        self.expanded.clear();
        self.pending_scans.clear();

        for root in roots {
            if !root.is_dir() {
                warn!("skipping vanished root during refresh: {}", root.display());
                continue;
            }
            self.registry.register_root(&root);
            self.expanded.insert(root.clone());
            if let Some(node) = self.registry.node_mut(&root) {
                node.children_loaded_once = true;
            }
            self.pending_scans.push_back(root);
        }
        self.start_next_pending();
    }

    /// Remove a tracked root and its cached subtree. Only roots may be
    /// removed; any scan running below the root is cancelled first.
    pub fn remove_root(&mut self, path: &Path) -> bool {
        if !self.registry.is_root(path) {
            return false;
        }
        let cancels_active = self
            .supervisor
            .active_root()
            .is_some_and(|r| r.starts_with(path));
        if cancels_active {
            self.supervisor.cleanup_worker();
        }
        self.pending_scans.retain(|p| !p.starts_with(path));
        self.expanded.retain(|p| !p.starts_with(path));
        self.registry.remove_root(path);
        info!("removed root {}", path.display());
        true
    }

    /// Drain pending scan events and apply them to the registry.
    ///
    /// Call once per frame or tick from the foreground. Returns `true` if
    /// the registry changed. Capped at [`MAX_EVENTS_PER_DRAIN`] events per
    /// call.
    pub fn process_events(&mut self) -> bool {
        let mut changed = false;
        for _ in 0..MAX_EVENTS_PER_DRAIN {
            let Some(event) = self.supervisor.try_recv() else {
                break;
            };
            match event {
                ScanEvent::NodeDiscovered { path, children } => {
                    self.registry.apply_discovered(&path, &children);
                    changed = true;
                }
                ScanEvent::ScanFailed {
                    path,
                    reason,
                    message,
                } => {
                    warn!(
                        "scan failed for {} ({}): {message}",
                        path.display(),
                        reason.as_str()
                    );
                    self.registry.apply_scan_failed(&path, &message);
                    changed = true;
                }
                ScanEvent::Completed => {
                    self.supervisor.reap_finished();
                    self.start_next_pending();
                    changed = true;
                }
            }
        }
        changed
    }

    /// Shut down the background worker and drop queued scans. Registry
    /// contents survive; call on application exit.
    pub fn shutdown(&mut self) {
        self.pending_scans.clear();
        self.supervisor.cleanup_worker();
    }

    // ── Indexing-pipeline interface ─────────────────────────────────────

    pub fn mark_indexing(&mut self, path: &Path) -> bool {
        self.registry.mark_indexing(path)
    }

    pub fn mark_indexed(&mut self, path: &Path, file_count: u64, indexed_count: u64) -> bool {
        self.registry.mark_indexed(path, file_count, indexed_count)
    }

    pub fn mark_error(&mut self, path: &Path, message: &str) -> bool {
        self.registry.mark_error(path, message)
    }

    pub fn clear_state(&mut self, path: &Path) -> bool {
        self.registry.clear_state(path)
    }

    pub fn exclude_path(&mut self, path: &Path) -> bool {
        self.registry.exclude_path(path)
    }

    pub fn indexed_paths(&self) -> std::collections::HashSet<PathBuf> {
        self.registry.indexed_paths()
    }

    pub fn excluded_paths(&self) -> std::collections::HashSet<PathBuf> {
        self.registry.excluded_paths()
    }

    pub fn indexing_paths(&self) -> std::collections::HashSet<PathBuf> {
        self.registry.indexing_paths()
    }

    pub fn error_paths(&self) -> std::collections::HashSet<PathBuf> {
        self.registry.error_paths()
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Shared scan trigger: set the duplicate-prevention flag first, then
    /// hand the request to the supervisor, or queue it behind the current
    /// scan. "Current" includes a finished worker whose events are still
    /// undrained; starting over it would discard them.
    fn issue_scan(&mut self, path: &Path) -> Result<(), TreeError> {
        if let Some(node) = self.registry.node_mut(path) {
            node.children_loaded_once = true;
        }
        let busy = self
            .supervisor
            .active_root()
            .is_some_and(|active| active != path);
        if busy {
            if !self.pending_scans.iter().any(|p| p.as_path() == path) {
                self.pending_scans.push_back(path.to_path_buf());
            }
            return Ok(());
        }
        self.supervisor.start_scan(path, LAZY_SCAN_DEPTH)
    }

    /// Start the next queued scan whose node still exists.
    fn start_next_pending(&mut self) {
        while let Some(next) = self.pending_scans.pop_front() {
            if !self.registry.contains(&next) {
                continue;
            }
            match self.supervisor.start_scan(&next, LAZY_SCAN_DEPTH) {
                Ok(()) => return,
                Err(err) => warn!("skipping queued scan: {err}"),
            }
        }
    }
}
