use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::WalkDir;

use super::filter::EventFilter;

/// Every non-ignored regular file below `dir`, parents before children.
///
/// Ignored directories are pruned, not descended into.
pub(super) fn scan_files(dir: &Path, filter: &Arc<EventFilter>) -> Vec<PathBuf> {
    let filter = Arc::clone(filter);

    WalkDir::new(dir)
        .skip_hidden(false)
        .sort(true)
        .process_read_dir(move |_, _, _, children| {
            children.retain(|entry| {
                entry
                    .as_ref()
                    .map_or(true, |entry| !filter.is_ignored(&entry.path()))
            });
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .collect()
}
