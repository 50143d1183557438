//! Shared test fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_SCRATCH_ID: AtomicU32 = AtomicU32::new(0);

/// Per-test scratch directory, removed on drop.
///
/// Uniqueness comes from the process id plus a process-local counter, so
/// parallel test binaries and parallel tests within one binary never collide.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(label: &str) -> Self {
        let id = NEXT_SCRATCH_ID.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "sidekick-test-{label}-{}-{id}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("scratch dir");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path under the scratch root; nothing is created.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Create a file under the scratch root with the given content,
    /// creating intermediate directories as needed.
    pub fn file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("scratch parent dirs");
        }
        fs::write(&path, content).expect("scratch file");
        path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
