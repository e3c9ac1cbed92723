//! DocMind folder-tree diagnostic CLI.
//!
//! Thin binary entry point. All logic lives in the `docmind-core` crate;
//! this binary scans a directory the way the desktop tree does and prints
//! the resulting rows, which makes the scanner easy to exercise outside
//! the GUI.

use docmind_core::tree::FolderTreeController;
use docmind_core::view;
use std::path::PathBuf;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let root = root
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("cannot resolve {}: {e}", root.display()))?;

    tracing::info!("scanning {}", root.display());

    let mut tree = FolderTreeController::new();
    tree.add_root(&root)?;

    // Pump events the way a GUI frame loop would, until the scan settles.
    // Each drain call is capped, so keep draining until the queue is empty
    // AND no scan is running or pending.
    loop {
        let changed = tree.process_events();
        if !changed && !tree.is_loading() {
            break;
        }
        if !changed {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    // Print everything the scan found, not just the lazily expanded level.
    let all_expanded: std::collections::HashSet<PathBuf> =
        tree.registry().iter().map(|n| n.path.clone()).collect();
    for row in view::visible_rows(tree.registry(), &all_expanded) {
        let indent = "  ".repeat(row.depth as usize);
        let access = if row.is_accessible { "" } else { " [inaccessible]" };
        println!("{indent}{} [{}]{access}", row.label, row.state.label());
    }

    tree.shutdown();
    Ok(())
}
