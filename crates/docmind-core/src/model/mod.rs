/// Data model — per-node state and the foreground-owned registry.
pub mod node;
pub mod registry;

pub use node::{FolderNode, FolderState};
pub use registry::TreeNodeRegistry;
