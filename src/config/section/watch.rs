//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! ignore_hidden = true                    # Skip dot-files and dot-directories
//! ignore = ["node_modules/**", "*.log"]   # Globs relative to the watched root
//! debounce_ms = 100                       # Per-path coalescing window, 0 disables
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const IGNORE: FieldPath = FieldPath::new("watch.ignore");

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub ignore_hidden: bool,
    pub ignore: Vec<String>,
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            ignore_hidden: true,
            ignore: vec!["node_modules/**".into()],
            debounce_ms: 100,
        }
    }
}

impl WatchConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for pattern in &self.ignore {
            if let Err(e) = Glob::new(pattern) {
                diag.error(IGNORE, format!("invalid glob `{pattern}`: {e}"));
            }
        }
    }

    /// Compiled ignore globs. Invalid patterns were rejected by `validate`.
    pub fn ignore_set(&self) -> GlobSet {
        build_globset(&self.ignore)
    }

    /// Debounce window, `None` when disabled.
    pub fn debounce(&self) -> Option<Duration> {
        (self.debounce_ms > 0).then(|| Duration::from_millis(self.debounce_ms))
    }
}

/// Compile patterns into a set, skipping any that fail to parse.
pub(crate) fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_watch_defaults() {
        let config = test_parse_config("");
        assert!(config.watch.ignore_hidden);
        assert_eq!(config.watch.debounce(), Some(Duration::from_millis(100)));
        assert!(config.watch.ignore_set().is_match("node_modules/lodash/index.js"));
    }

    #[test]
    fn test_debounce_disabled() {
        let config = test_parse_config("[watch]\ndebounce_ms = 0");
        assert_eq!(config.watch.debounce(), None);
    }

    #[test]
    fn test_invalid_glob_reported() {
        let config = test_parse_config("[watch]\nignore = [\"src/[\"]");
        let mut diag = ConfigDiagnostics::new();
        config.watch.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
