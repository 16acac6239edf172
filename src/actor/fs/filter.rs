use std::path::{Path, PathBuf};

use globset::GlobSet;

use super::debouncer::is_temp_file;
use crate::config::WatchConfig;
use crate::utils::path::{has_hidden_component, is_within, strip_root};

/// Decides which paths under a watch root are never reported.
///
/// A glob matching a directory hides everything beneath it.
pub struct EventFilter {
    root: PathBuf,
    ignore_hidden: bool,
    ignore: GlobSet,
    exclude: Vec<PathBuf>,
}

impl EventFilter {
    pub fn new(root: impl Into<PathBuf>, watch: &WatchConfig) -> Self {
        Self {
            root: root.into(),
            ignore_hidden: watch.ignore_hidden,
            ignore: watch.ignore_set(),
            exclude: Vec::new(),
        }
    }

    /// Also drop `subtree` (a nested root owned by another watcher).
    pub fn excluding(mut self, subtree: impl Into<PathBuf>) -> Self {
        self.exclude.push(subtree.into());
        self
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.exclude.iter().any(|subtree| is_within(path, subtree)) || is_temp_file(path) {
            return true;
        }

        let rel = strip_root(path, &self.root);
        if rel.as_os_str().is_empty() {
            return false;
        }
        if self.ignore_hidden && has_hidden_component(&rel) {
            return true;
        }
        rel.ancestors()
            .filter(|a| !a.as_os_str().is_empty())
            .any(|a| self.ignore.is_match(a))
    }
}
