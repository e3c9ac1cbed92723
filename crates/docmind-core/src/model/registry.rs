/// Foreground-owned map from path to node, plus root bookkeeping.
///
/// The registry is only ever mutated from the foreground: either when scan
/// events are applied on receipt, or when the indexing pipeline issues a
/// state command. The scan thread never touches it — event delivery is the
/// synchronization primitive, so no locking is needed here.
use super::node::{FolderNode, FolderState};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TreeNodeRegistry {
    nodes: HashMap<PathBuf, FolderNode>,
    /// Tracked roots in registration order — `refresh_all` replays this order.
    roots: Vec<PathBuf>,
}

impl TreeNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tracked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, path: &Path) -> Option<&FolderNode> {
        self.nodes.get(path)
    }

    pub(crate) fn node_mut(&mut self, path: &Path) -> Option<&mut FolderNode> {
        self.nodes.get_mut(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Tracked roots in registration order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_root(&self, path: &Path) -> bool {
        self.roots.iter().any(|r| r == path)
    }

    /// Iterate over all tracked nodes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &FolderNode> {
        self.nodes.values()
    }

    /// Register a top-level root. Registering a path that is already tracked
    /// (as a root or as somebody's child) is a no-op; returns whether a node
    /// was created.
    pub fn register_root(&mut self, path: &Path) -> bool {
        if self.nodes.contains_key(path) {
            return false;
        }
        self.nodes
            .insert(path.to_path_buf(), FolderNode::new_root(path.to_path_buf()));
        self.roots.push(path.to_path_buf());
        true
    }

    /// Apply a `NodeDiscovered` event.
    ///
    /// Creates a Folder node for every unseen child of `parent` and records
    /// it in the parent's child list. Children already present keep their
    /// lifecycle state, so re-discovery never erases prior indexing work.
    /// Events whose parent is no longer tracked (purged while the scan was
    /// finishing) are dropped.
    pub fn apply_discovered(&mut self, parent: &Path, children: &[PathBuf]) {
        if !self.nodes.contains_key(parent) {
            debug!("dropping discovery for unregistered parent {}", parent.display());
            return;
        }
        for child in children {
            self.nodes.entry(child.clone()).or_insert_with(|| {
                FolderNode::new_folder(child.clone(), parent.to_path_buf())
            });
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            for child in children {
                if !node.children.contains(child) {
                    node.children.push(child.clone());
                }
            }
        }
    }

    /// Apply a `ScanFailed` event: the node becomes inaccessible, stores the
    /// failure detail, and moves to Error where the transition table allows.
    /// Roots keep their type but still record the failure.
    pub fn apply_scan_failed(&mut self, path: &Path, message: &str) {
        if let Some(node) = self.nodes.get_mut(path) {
            node.is_accessible = false;
            node.error_message = Some(message.to_string());
            if node.state.can_transition(FolderState::Error) {
                node.state = FolderState::Error;
            }
        }
    }

    fn transition(&mut self, path: &Path, next: FolderState) -> bool {
        match self.nodes.get_mut(path) {
            Some(node) if node.state.can_transition(next) => {
                node.state = next;
                true
            }
            Some(node) => {
                debug!(
                    "ignoring illegal transition {:?} -> {next:?} for {}",
                    node.state,
                    path.display()
                );
                false
            }
            None => false,
        }
    }

    /// The indexing pipeline started processing `path`.
    pub fn mark_indexing(&mut self, path: &Path) -> bool {
        self.transition(path, FolderState::Indexing)
    }

    /// Indexing finished for `path`; record the statistics.
    pub fn mark_indexed(&mut self, path: &Path, file_count: u64, indexed_count: u64) -> bool {
        if !self.transition(path, FolderState::Indexed) {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(path) {
            node.file_count = file_count;
            node.indexed_count = indexed_count;
        }
        true
    }

    /// Indexing failed for `path`.
    pub fn mark_error(&mut self, path: &Path, message: &str) -> bool {
        if !self.transition(path, FolderState::Error) {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(path) {
            node.error_message = Some(message.to_string());
        }
        true
    }

    /// Explicit clear back to Folder, restoring accessibility and dropping
    /// the stored error detail. Clearing a node already in Folder state
    /// leaves it unchanged.
    pub fn clear_state(&mut self, path: &Path) -> bool {
        if !self.transition(path, FolderState::Folder) {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(path) {
            node.is_accessible = true;
            node.error_message = None;
        }
        true
    }

    /// Exclude `path` from search.
    pub fn exclude_path(&mut self, path: &Path) -> bool {
        self.transition(path, FolderState::Excluded)
    }

    /// Paths currently in `state`, sorted for deterministic iteration.
    pub fn nodes_in_state(&self, state: FolderState) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .nodes
            .values()
            .filter(|n| n.state == state)
            .map(|n| n.path.clone())
            .collect();
        paths.sort_unstable();
        paths
    }

    fn paths_in_state(&self, state: FolderState) -> HashSet<PathBuf> {
        self.nodes
            .values()
            .filter(|n| n.state == state)
            .map(|n| n.path.clone())
            .collect()
    }

    pub fn indexed_paths(&self) -> HashSet<PathBuf> {
        self.paths_in_state(FolderState::Indexed)
    }

    pub fn excluded_paths(&self) -> HashSet<PathBuf> {
        self.paths_in_state(FolderState::Excluded)
    }

    pub fn indexing_paths(&self) -> HashSet<PathBuf> {
        self.paths_in_state(FolderState::Indexing)
    }

    pub fn error_paths(&self) -> HashSet<PathBuf> {
        self.paths_in_state(FolderState::Error)
    }

    /// Every tracked path at or below `prefix`, sorted.
    ///
    /// Matching is path-component aware (`Path::starts_with`), so a sibling
    /// whose name merely shares a string prefix (`/a/b` vs `/a/b2`) does not
    /// match.
    pub fn subtree_paths(&self, prefix: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .nodes
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect();
        paths.sort_unstable();
        paths
    }

    /// Remove every node at or below `prefix`. With `keep_self` the prefix
    /// node itself survives (refresh semantics) and only its descendants go.
    pub fn purge_subtree(&mut self, prefix: &Path, keep_self: bool) {
        let doomed: Vec<PathBuf> = self
            .subtree_paths(prefix)
            .into_iter()
            .filter(|p| !(keep_self && p.as_path() == prefix))
            .collect();
        for path in &doomed {
            if let Some(node) = self.nodes.remove(path) {
                // Detach from a surviving parent's child list.
                if let Some(parent) = node.parent {
                    if let Some(parent_node) = self.nodes.get_mut(&parent) {
                        parent_node.children.retain(|c| c != path);
                    }
                }
            }
            self.roots.retain(|r| r != path);
        }
    }

    /// Drop a tracked root and its whole subtree. Non-roots are rejected.
    pub fn remove_root(&mut self, path: &Path) -> bool {
        if !self.is_root(path) {
            return false;
        }
        self.purge_subtree(path, false);
        true
    }

    /// Drop every node and root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_root(root: &str) -> TreeNodeRegistry {
        let mut registry = TreeNodeRegistry::new();
        assert!(registry.register_root(Path::new(root)));
        registry
    }

    #[test]
    fn register_root_is_idempotent() {
        let mut registry = registry_with_root("/data/docs");
        assert!(!registry.register_root(Path::new("/data/docs")));
        assert_eq!(registry.roots().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn discovery_creates_unique_children() {
        let mut registry = registry_with_root("/data/docs");
        let children = vec![
            PathBuf::from("/data/docs/a"),
            PathBuf::from("/data/docs/b"),
        ];
        registry.apply_discovered(Path::new("/data/docs"), &children);
        // Re-delivery of the same event must not duplicate anything.
        registry.apply_discovered(Path::new("/data/docs"), &children);

        assert_eq!(registry.len(), 3);
        let root = registry.node(Path::new("/data/docs")).unwrap();
        assert_eq!(root.children, children);
        let a = registry.node(Path::new("/data/docs/a")).unwrap();
        assert_eq!(a.state, FolderState::Folder);
        assert_eq!(a.parent.as_deref(), Some(Path::new("/data/docs")));
    }

    #[test]
    fn rediscovery_preserves_lifecycle_state() {
        let mut registry = registry_with_root("/data/docs");
        let children = vec![PathBuf::from("/data/docs/a")];
        registry.apply_discovered(Path::new("/data/docs"), &children);

        assert!(registry.mark_indexing(Path::new("/data/docs/a")));
        assert!(registry.mark_indexed(Path::new("/data/docs/a"), 12, 12));

        registry.apply_discovered(Path::new("/data/docs"), &children);
        let a = registry.node(Path::new("/data/docs/a")).unwrap();
        assert_eq!(a.state, FolderState::Indexed);
        assert_eq!(a.file_count, 12);
    }

    #[test]
    fn discovery_for_unknown_parent_is_dropped() {
        let mut registry = registry_with_root("/data/docs");
        registry.apply_discovered(
            Path::new("/data/elsewhere"),
            &[PathBuf::from("/data/elsewhere/x")],
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn scan_failure_marks_error_and_inaccessible() {
        let mut registry = registry_with_root("/data/docs");
        registry.apply_discovered(Path::new("/data/docs"), &[PathBuf::from("/data/docs/b")]);
        registry.apply_scan_failed(Path::new("/data/docs/b"), "permission denied");

        let b = registry.node(Path::new("/data/docs/b")).unwrap();
        assert_eq!(b.state, FolderState::Error);
        assert!(!b.is_accessible);
        assert_eq!(b.error_message.as_deref(), Some("permission denied"));
    }

    #[test]
    fn scan_failure_on_root_keeps_root_state() {
        let mut registry = registry_with_root("/data/docs");
        registry.apply_scan_failed(Path::new("/data/docs"), "boom");
        let root = registry.node(Path::new("/data/docs")).unwrap();
        assert_eq!(root.state, FolderState::Root);
        assert!(!root.is_accessible);
    }

    #[test]
    fn indexing_commands_follow_the_table() {
        let mut registry = registry_with_root("/data/docs");
        let p = PathBuf::from("/data/docs/a");
        registry.apply_discovered(Path::new("/data/docs"), &[p.clone()]);

        // Folder -> Indexed skips the Indexing phase: rejected.
        assert!(!registry.mark_indexed(&p, 10, 9));
        assert!(registry.mark_indexing(&p));
        assert!(registry.indexing_paths().contains(&p));
        assert!(registry.mark_indexed(&p, 10, 9));

        let node = registry.node(&p).unwrap();
        assert_eq!(node.state, FolderState::Indexed);
        assert_eq!((node.file_count, node.indexed_count), (10, 9));
        assert!(!registry.indexing_paths().contains(&p));
        assert!(registry.indexed_paths().contains(&p));

        // Excluding a root is rejected; excluding the folder is not.
        assert!(!registry.exclude_path(Path::new("/data/docs")));
        assert!(registry.exclude_path(&p));
        assert!(registry.excluded_paths().contains(&p));
    }

    #[test]
    fn clear_state_is_idempotent_on_folder() {
        let mut registry = registry_with_root("/data/docs");
        let p = PathBuf::from("/data/docs/a");
        registry.apply_discovered(Path::new("/data/docs"), &[p.clone()]);

        assert!(!registry.clear_state(&p));
        let node = registry.node(&p).unwrap();
        assert_eq!(node.state, FolderState::Folder);
        assert!(node.is_accessible);
    }

    #[test]
    fn clear_state_restores_errored_folder() {
        let mut registry = registry_with_root("/data/docs");
        let p = PathBuf::from("/data/docs/a");
        registry.apply_discovered(Path::new("/data/docs"), &[p.clone()]);
        registry.apply_scan_failed(&p, "transient failure");

        assert!(registry.clear_state(&p));
        let node = registry.node(&p).unwrap();
        assert_eq!(node.state, FolderState::Folder);
        assert!(node.is_accessible);
        assert!(node.error_message.is_none());
    }

    #[test]
    fn subtree_matching_is_component_aware() {
        let mut registry = registry_with_root("/a/b");
        registry.register_root(Path::new("/a/b2"));
        registry.apply_discovered(Path::new("/a/b"), &[PathBuf::from("/a/b/c")]);

        let subtree = registry.subtree_paths(Path::new("/a/b"));
        assert_eq!(
            subtree,
            vec![PathBuf::from("/a/b"), PathBuf::from("/a/b/c")],
            "/a/b2 shares a string prefix but is not part of the subtree"
        );
    }

    #[test]
    fn purge_subtree_keep_self_leaves_the_node() {
        let mut registry = registry_with_root("/data/docs");
        registry.apply_discovered(
            Path::new("/data/docs"),
            &[PathBuf::from("/data/docs/a"), PathBuf::from("/data/docs/b")],
        );
        registry.apply_discovered(
            Path::new("/data/docs/a"),
            &[PathBuf::from("/data/docs/a/x")],
        );

        registry.purge_subtree(Path::new("/data/docs"), true);
        assert_eq!(registry.len(), 1);
        let root = registry.node(Path::new("/data/docs")).unwrap();
        assert!(root.children.is_empty());
        assert!(registry.is_root(Path::new("/data/docs")));
    }

    #[test]
    fn remove_root_rejects_non_roots() {
        let mut registry = registry_with_root("/data/docs");
        let child = PathBuf::from("/data/docs/a");
        registry.apply_discovered(Path::new("/data/docs"), &[child.clone()]);

        assert!(!registry.remove_root(&child));
        assert!(registry.remove_root(Path::new("/data/docs")));
        assert!(registry.is_empty());
        assert!(registry.roots().is_empty());
    }
}
