use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::sync::ChangeKind;
use crate::sync::deploy::TEMP_SUFFIX;
use crate::utils::path::clean_path;

/// Wake-up interval when nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

struct Pending {
    kind: ChangeKind,
    last_event: Instant,
}

/// Per-path debouncer: a path is released once it has been quiet for the
/// window. Pure timing and deduplication, no filesystem checks.
pub(crate) struct Debouncer {
    window: Duration,
    changes: FxHashMap<PathBuf, Pending>,
}

impl Debouncer {
    /// `None` releases every path on the next tick.
    pub(crate) fn new(window: Option<Duration>) -> Self {
        Self {
            window: window.unwrap_or(Duration::ZERO),
            changes: FxHashMap::default(),
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → nothing (appeared and vanished)
    /// - otherwise the first kind wins
    ///
    /// Every event restarts the path's quiet window.
    pub(crate) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        let now = Instant::now();
        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            // Lexical only: a symlink must map by its own name
            let path = clean_path(path);

            let Some(existing) = self.changes.get_mut(&path) else {
                self.changes.insert(
                    path,
                    Pending {
                        kind,
                        last_event: now,
                    },
                );
                continue;
            };

            match (existing.kind, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                    crate::debug!("watch"; "restore removed->{}: {}", kind.label(), path.display());
                    existing.kind = kind;
                }
                (ChangeKind::Modified, ChangeKind::Removed) => {
                    existing.kind = ChangeKind::Removed;
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    crate::debug!("watch"; "discard created+removed: {}", path.display());
                    self.changes.remove(&path);
                    continue;
                }
                _ => {}
            }
            existing.last_event = now;
        }
    }

    /// Take every path whose window has elapsed.
    pub(crate) fn take_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        let window = self.window;
        let ready: Vec<PathBuf> = self
            .changes
            .iter()
            .filter(|(_, pending)| pending.last_event.elapsed() >= window)
            .map(|(path, _)| path.clone())
            .collect();

        if ready.is_empty() {
            return None;
        }

        Some(
            ready
                .into_iter()
                .filter_map(|path| self.changes.remove(&path).map(|p| (path, p.kind)))
                .collect(),
        )
    }

    /// Time until the earliest pending path is released.
    pub(crate) fn sleep_duration(&self) -> Duration {
        self.changes
            .values()
            .map(|pending| self.window.saturating_sub(pending.last_event.elapsed()))
            .min()
            .map_or(IDLE, |remaining| remaining.max(Duration::from_millis(1)))
    }

    #[cfg(test)]
    pub(super) fn kind_of(&self, path: &Path) -> Option<ChangeKind> {
        self.changes.get(path).map(|pending| pending.kind)
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Editor backups, swap files and half-written deploys.
pub(crate) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.ends_with(TEMP_SUFFIX)
}
