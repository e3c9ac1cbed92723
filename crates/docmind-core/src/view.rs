/// Render adapter — flattens the registry into rows any widget toolkit can
/// draw, without the toolkit owning node state.
use crate::model::{FolderState, TreeNodeRegistry};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Hard cap on rows produced per flatten. A tree that reaches this is
/// pathological (cycle or runaway registry) and gets truncated rather than
/// stalling the frame.
pub const MAX_VISIBLE_ROWS: usize = 500_000;

/// One drawable row of the folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub path: PathBuf,
    /// Display text, e.g. `Documents (120/134)` once indexed.
    pub label: String,
    /// Indentation level; roots are 0.
    pub depth: u16,
    pub state: FolderState,
    pub is_expanded: bool,
    pub is_accessible: bool,
    /// Whether the row should draw an expansion arrow. True while children
    /// are unknown, so every unscanned folder stays expandable.
    pub has_children: bool,
}

/// Flatten the visible portion of the tree, depth-first, roots in
/// registration order and siblings in their discovered (sorted) order.
/// Children of a collapsed node are skipped, not dropped.
pub fn visible_rows(registry: &TreeNodeRegistry, expanded: &HashSet<PathBuf>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    for root in registry.roots() {
        push_rows(registry, expanded, root, 0, &mut rows);
    }
    rows
}

fn push_rows(
    registry: &TreeNodeRegistry,
    expanded: &HashSet<PathBuf>,
    path: &Path,
    depth: u16,
    rows: &mut Vec<TreeRow>,
) {
    if rows.len() >= MAX_VISIBLE_ROWS {
        return;
    }
    let Some(node) = registry.node(path) else {
        return;
    };
    let is_expanded = expanded.contains(path);
    rows.push(TreeRow {
        path: node.path.clone(),
        label: row_label(node.name.as_str(), node.state, node.file_count, node.indexed_count),
        depth,
        state: node.state,
        is_expanded,
        is_accessible: node.is_accessible,
        has_children: !node.children.is_empty() || !node.children_loaded_once,
    });
    if !is_expanded {
        return;
    }
    for child in &node.children {
        push_rows(registry, expanded, child, depth + 1, rows);
    }
}

/// Row text: the folder name, with `(indexed/total)` appended once indexing
/// has produced counts.
fn row_label(name: &str, state: FolderState, file_count: u64, indexed_count: u64) -> String {
    match state {
        FolderState::Indexed => format!("{name} ({indexed_count}/{file_count})"),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_tree() -> TreeNodeRegistry {
        let mut registry = TreeNodeRegistry::new();
        registry.register_root(Path::new("/docs"));
        registry.apply_discovered(
            Path::new("/docs"),
            &[PathBuf::from("/docs/a"), PathBuf::from("/docs/b")],
        );
        registry.apply_discovered(Path::new("/docs/a"), &[PathBuf::from("/docs/a/x")]);
        registry
    }

    #[test]
    fn collapsed_root_yields_one_row() {
        let registry = registry_with_tree();
        let rows = visible_rows(&registry, &HashSet::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].path, Path::new("/docs"));
        assert_eq!(rows[0].depth, 0);
        assert!(!rows[0].is_expanded);
    }

    #[test]
    fn expansion_reveals_children_depth_first() {
        let registry = registry_with_tree();
        let expanded: HashSet<PathBuf> =
            [PathBuf::from("/docs"), PathBuf::from("/docs/a")].into();
        let rows = visible_rows(&registry, &expanded);

        let paths: Vec<&Path> = rows.iter().map(|r| r.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("/docs"),
                Path::new("/docs/a"),
                Path::new("/docs/a/x"),
                Path::new("/docs/b"),
            ]
        );
        assert_eq!(rows[2].depth, 2);
    }

    #[test]
    fn collapsed_branch_is_skipped_not_dropped() {
        let registry = registry_with_tree();
        let expanded: HashSet<PathBuf> = [PathBuf::from("/docs")].into();
        let rows = visible_rows(&registry, &expanded);
        // /docs/a is visible but collapsed; /docs/a/x stays hidden.
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.path != Path::new("/docs/a/x")));
    }

    #[test]
    fn indexed_label_carries_counts() {
        let mut registry = registry_with_tree();
        registry.mark_indexing(Path::new("/docs/b"));
        registry.mark_indexed(Path::new("/docs/b"), 134, 120);

        let expanded: HashSet<PathBuf> = [PathBuf::from("/docs")].into();
        let rows = visible_rows(&registry, &expanded);
        let b = rows.iter().find(|r| r.path == Path::new("/docs/b")).unwrap();
        assert_eq!(b.label, "b (120/134)");
        assert_eq!(b.state, FolderState::Indexed);
    }

    #[test]
    fn unscanned_folder_still_offers_expansion() {
        let registry = registry_with_tree();
        let expanded: HashSet<PathBuf> =
            [PathBuf::from("/docs"), PathBuf::from("/docs/a")].into();
        let rows = visible_rows(&registry, &expanded);
        // /docs/a/x has never been scanned: children unknown, arrow stays.
        let x = rows.iter().find(|r| r.path == Path::new("/docs/a/x")).unwrap();
        assert!(x.has_children);
        // /docs/a has loaded children and has some.
        let a = rows.iter().find(|r| r.path == Path::new("/docs/a")).unwrap();
        assert!(a.has_children);
    }
}
