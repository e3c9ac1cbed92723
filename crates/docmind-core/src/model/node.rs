/// A single folder known to the tree, plus its lifecycle state machine.
///
/// Nodes are plain data — no widget type is subclassed and no toolkit owns
/// their lifetime. The registry owns every node; render adapters read them
/// through [`crate::view`].
use compact_str::CompactString;
use std::path::{Path, PathBuf};

/// Lifecycle state of one folder in the tree. States are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderState {
    /// Top-level registered folder. Immutable once assigned.
    Root,
    /// Plain discovered folder — the default state.
    Folder,
    /// The indexing pipeline is currently processing this folder.
    Indexing,
    /// Indexing finished for this folder.
    Indexed,
    /// Excluded from search by the user.
    Excluded,
    /// A scan or indexing operation failed here.
    Error,
}

impl FolderState {
    /// The legal transition table. Commands requesting anything outside it
    /// are silent no-ops, not errors.
    pub fn can_transition(self, next: FolderState) -> bool {
        use FolderState::*;
        match (self, next) {
            // Root is immutable, and nothing may become Root after
            // registration.
            (Root, _) | (_, Root) => false,
            (Folder, Indexing) | (Folder, Error) | (Folder, Excluded) => true,
            (Indexing, Indexed) | (Indexing, Error) | (Indexing, Excluded) => true,
            // Re-indexing an already indexed folder is a re-scan.
            (Indexed, Indexing) | (Indexed, Excluded) => true,
            // Explicit clear back to the default state.
            (Excluded, Folder) => true,
            (Error, Folder) | (Error, Excluded) => true,
            _ => false,
        }
    }

    /// Whether the indexing pipeline is busy with this folder.
    pub fn is_processing(self) -> bool {
        self == FolderState::Indexing
    }

    /// Whether the folder can be offered for indexing or search.
    pub fn is_available(self) -> bool {
        matches!(
            self,
            FolderState::Root | FolderState::Folder | FolderState::Indexed
        )
    }

    /// Short label used by render adapters and diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            FolderState::Root => "root",
            FolderState::Folder => "folder",
            FolderState::Indexing => "indexing",
            FolderState::Indexed => "indexed",
            FolderState::Excluded => "excluded",
            FolderState::Error => "error",
        }
    }
}

/// The registry's record of one filesystem path.
#[derive(Debug, Clone)]
pub struct FolderNode {
    /// Absolute path — the registry key. No two nodes share one.
    pub path: PathBuf,

    /// Final path component, or the whole path for drive-style roots that
    /// have none.
    pub name: CompactString,

    pub state: FolderState,

    /// Statistics only, maintained by the indexing pipeline.
    pub file_count: u64,
    pub indexed_count: u64,

    /// Cleared once a scan or stat operation fails for this path.
    pub is_accessible: bool,

    /// Set the moment a lazy-expansion scan is issued for this node — before
    /// the result is known — so duplicate triggers are impossible even when
    /// the scan fails.
    pub children_loaded_once: bool,

    /// Path of the parent node; `None` for roots.
    pub parent: Option<PathBuf>,

    /// Direct children in discovery order (the worker emits them sorted).
    pub children: Vec<PathBuf>,

    /// Detail for the Error state; surfaced by the UI as supplementary info.
    pub error_message: Option<String>,
}

impl FolderNode {
    /// Create a top-level root node.
    pub fn new_root(path: PathBuf) -> Self {
        Self::with_state(path, FolderState::Root, None)
    }

    /// Create a plain folder node under `parent`.
    pub fn new_folder(path: PathBuf, parent: PathBuf) -> Self {
        Self::with_state(path, FolderState::Folder, Some(parent))
    }

    fn with_state(path: PathBuf, state: FolderState, parent: Option<PathBuf>) -> Self {
        let name = Self::display_name(&path);
        Self {
            path,
            name,
            state,
            file_count: 0,
            indexed_count: 0,
            is_accessible: true,
            children_loaded_once: false,
            parent,
            children: Vec::new(),
            error_message: None,
        }
    }

    /// Display name for a path: its final component, or the full path when
    /// there is none (e.g. a drive root).
    pub fn display_name(path: &Path) -> CompactString {
        match path.file_name() {
            Some(name) => CompactString::new(name.to_string_lossy()),
            None => CompactString::new(path.to_string_lossy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FolderState::*;

    #[test]
    fn root_is_immutable() {
        for next in [Folder, Indexing, Indexed, Excluded, Error] {
            assert!(!Root.can_transition(next), "Root -> {next:?} must be illegal");
        }
        for from in [Folder, Indexing, Indexed, Excluded, Error] {
            assert!(!from.can_transition(Root), "{from:?} -> Root must be illegal");
        }
    }

    #[test]
    fn indexing_lifecycle_transitions() {
        assert!(Folder.can_transition(Indexing));
        assert!(Indexing.can_transition(Indexed));
        assert!(Indexing.can_transition(Error));
        // Re-scan of an already indexed folder.
        assert!(Indexed.can_transition(Indexing));
        // Skipping the Indexing phase is not allowed.
        assert!(!Folder.can_transition(Indexed));
        assert!(!Indexed.can_transition(Error));
    }

    #[test]
    fn exclusion_and_clear() {
        for from in [Folder, Indexing, Indexed, Error] {
            assert!(from.can_transition(Excluded), "{from:?} -> Excluded must be legal");
        }
        assert!(Excluded.can_transition(Folder));
        assert!(Error.can_transition(Folder));
        assert!(!Indexed.can_transition(Folder));
        // Self-transitions are no-ops handled by the caller, not table entries.
        assert!(!Excluded.can_transition(Excluded));
    }

    #[test]
    fn scan_failure_transition() {
        // A folder whose scan fails moves straight to Error.
        assert!(Folder.can_transition(Error));
    }

    #[test]
    fn display_name_uses_last_component() {
        assert_eq!(
            FolderNode::display_name(Path::new("/home/user/Documents")),
            "Documents"
        );
        // A bare root has no file name — fall back to the full path.
        assert_eq!(FolderNode::display_name(Path::new("/")), "/");
    }
}
