use crate::actor::fs::EventFilter;
use crate::config::SyncConfig;
use crate::sync::{RootRole, WatchRoot};

/// The session's watch roots, each with its filter.
///
/// A build-output root nested in the source root belongs to the artifact
/// stage only, so the source watcher skips that subtree.
pub(super) fn collect_watch_roots(config: &SyncConfig) -> Vec<(WatchRoot, EventFilter)> {
    let paths = &config.paths;

    let mut source_filter = EventFilter::new(&paths.source, &config.watch);
    if paths.build_output_nested() {
        source_filter = source_filter.excluding(&paths.build_output);
    }

    vec![
        (WatchRoot::new(&paths.source, RootRole::Primary), source_filter),
        (
            WatchRoot::new(&paths.build_output, RootRole::BuildOutput),
            EventFilter::new(&paths.build_output, &config.watch),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_sync_config;

    #[test]
    fn test_nested_build_output_excluded_from_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello");
        std::fs::create_dir(&source).unwrap();
        let config = test_sync_config(&source, &dir.path().join("target"));

        let roots = collect_watch_roots(&config);
        let (primary, filter) = &roots[0];
        let (output, output_filter) = &roots[1];

        assert_eq!(primary.role, RootRole::Primary);
        assert_eq!(output.role, RootRole::BuildOutput);
        assert_eq!(output.path, config.paths.build_output);
        assert!(filter.is_ignored(&config.paths.build_output.join("widget.js")));
        assert!(!output_filter.is_ignored(&config.paths.build_output.join("widget.js")));
        assert!(!filter.is_ignored(&config.paths.source.join("hello.php")));
    }
}
