/// DocMind Core — folder scanning and tree state.
///
/// This crate contains the folder-navigation engine with zero UI
/// dependencies. The presentation layer (tree widget, context menus) and the
/// indexing pipeline are external collaborators: the first consumes
/// [`view::TreeRow`] snapshots, the second drives the per-node lifecycle
/// through the commands on [`tree::FolderTreeController`].
///
/// # Modules
///
/// - [`model`] — Per-node data, lifecycle state machine, and the
///   foreground-owned path registry.
/// - [`scanner`] — Background directory walking with supervised worker
///   lifecycle and FIFO event delivery.
/// - [`tree`] — Lazy-expansion controller tying scans to the registry.
/// - [`view`] — Render adapter mapping registry state to plain rows.
pub mod error;
pub mod model;
pub mod scanner;
pub mod tree;
pub mod view;
