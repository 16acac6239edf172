use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::filter::EventFilter;
use super::scan::scan_files;
use crate::sync::{ChangeEvent, ChangeKind, RootRole};

/// Classifies raw debounced changes into `ChangeEvent`s for one root.
///
/// Pipeline: drop_ignored → correct_by_existence → expand_created_dirs → filter_actionable
pub(super) struct EventClassifier;

impl EventClassifier {
    /// Removals come first so a rename vacates its old path before the new
    /// one is written; the rest is ordered by path, parents first.
    pub(super) fn classify(
        raw: FxHashMap<PathBuf, ChangeKind>,
        filter: &Arc<EventFilter>,
        role: RootRole,
    ) -> Vec<ChangeEvent> {
        let mut changes = raw;

        changes.retain(|path, _| !filter.is_ignored(path));
        Self::correct_by_existence(&mut changes);
        Self::expand_created_dirs(&mut changes, filter);
        Self::filter_actionable(&mut changes);

        let mut events: Vec<ChangeEvent> = changes
            .into_iter()
            .map(|(path, kind)| ChangeEvent::new(kind, path, role))
            .collect();
        events.sort_by(|a, b| {
            (a.kind != ChangeKind::Removed)
                .cmp(&(b.kind != ChangeKind::Removed))
                .then_with(|| a.path.cmp(&b.path))
        });
        events
    }

    /// Reconcile event kinds with actual filesystem state.
    ///
    /// The watcher may report stale events (e.g., Created for a file that's already
    /// been deleted, or Removed for a file that still exists after an atomic save).
    /// A directory renamed or moved into the root only reports a name change,
    /// so an existing directory is always treated as created.
    pub(super) fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        for (path, kind) in changes.iter_mut() {
            let corrected = match (*kind, path.exists()) {
                (ChangeKind::Modified, false) => ChangeKind::Removed,
                (ChangeKind::Modified | ChangeKind::Removed, true) if path.is_dir() => {
                    ChangeKind::Created
                }
                (ChangeKind::Removed, true) => ChangeKind::Modified,
                _ => continue,
            };
            crate::debug!("watch"; "{}->{}: {}", kind.label(), corrected.label(), path.display());
            *kind = corrected;
        }
        changes.retain(|path, kind| {
            let gone = *kind == ChangeKind::Created && !path.exists();
            if gone {
                crate::debug!("watch"; "discard created (gone): {}", path.display());
            }
            !gone
        });
    }

    /// A directory that appears fully formed (moved in, renamed, extracted)
    /// never reports its contents. Report them as created.
    fn expand_created_dirs(changes: &mut FxHashMap<PathBuf, ChangeKind>, filter: &Arc<EventFilter>) {
        let created_dirs: Vec<PathBuf> = changes
            .iter()
            .filter(|(path, kind)| **kind == ChangeKind::Created && path.is_dir())
            .map(|(path, _)| path.clone())
            .collect();

        for dir in created_dirs {
            for file in scan_files(&dir, filter) {
                changes.entry(file).or_insert(ChangeKind::Created);
            }
        }
    }

    /// Filter to actionable events only.
    ///
    /// - Created: file or directory that still exists
    /// - Modified: regular file
    /// - Removed: always, the engine ignores paths it never deployed
    pub(super) fn filter_actionable(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        changes.retain(|path, kind| match kind {
            ChangeKind::Created => path.exists(),
            ChangeKind::Modified => path.is_file(),
            ChangeKind::Removed => true,
        });
    }
}
