use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// Keeps one root watched across deletion and recreation.
///
/// A root missing at startup, or deleted later, is picked up again by
/// [`RootWatch::reattach`] once it exists.
pub(super) struct RootWatch {
    path: PathBuf,
    attached: bool,
}

impl RootWatch {
    /// Start watching `path` if it exists. Failing to watch an existing root
    /// is an error.
    pub(super) fn attach(path: &Path, watcher: &mut RecommendedWatcher) -> notify::Result<Self> {
        let attached = path.exists();
        if attached {
            watcher.watch(path, RecursiveMode::Recursive)?;
        } else {
            crate::debug!("watch"; "not yet present: {}", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
            attached,
        })
    }

    pub(super) fn is_attached(&self) -> bool {
        self.attached
    }

    /// Returns the root when this call attached it again.
    pub(super) fn reattach(&mut self, watcher: &mut RecommendedWatcher) -> Option<&Path> {
        // The old inotify handle died with the directory
        if !self.path.exists() {
            self.attached = false;
            return None;
        }
        if self.attached || watcher.watch(&self.path, RecursiveMode::Recursive).is_err() {
            return None;
        }

        self.attached = true;
        crate::log!("watch"; "watching {}", self.path.display());
        Some(&self.path)
    }
}
