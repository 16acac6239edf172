//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "."                        # Plugin working directory
//! build_output = "dist"               # Compiler output, relative to source
//! runtime = "wordpress-dev-env"       # Local WordPress install
//! target = "wordpress-dev-env/wp-content/plugins/my-plugin"
//! ```
//!
//! `target` defaults to `<runtime>/wp-content/plugins/<plugin-name>`, where the
//! plugin name is the source directory's name.

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::is_within;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SOURCE: FieldPath = FieldPath::new("paths.source");
const BUILD_OUTPUT: FieldPath = FieldPath::new("paths.build_output");
const TARGET: FieldPath = FieldPath::new("paths.target");

/// Directory layout of a session. Absolute after `SyncConfig::load`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Primary source root (the plugin being edited).
    pub source: PathBuf,

    /// Build-output root, relative to `source` unless absolute.
    pub build_output: PathBuf,

    /// WordPress runtime directory.
    pub runtime: PathBuf,

    /// Deployed plugin directory inside the runtime.
    pub target: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            build_output: PathBuf::from("dist"),
            runtime: PathBuf::from("wordpress-dev-env"),
            target: None,
        }
    }
}

impl PathsConfig {
    /// Plugin directory name, used for the default target and `$WPSYNC_PLUGIN`.
    pub fn plugin_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "plugin".to_string())
    }

    /// Deployed plugin root.
    pub fn target(&self) -> PathBuf {
        self.target.clone().unwrap_or_else(|| {
            self.runtime
                .join("wp-content")
                .join("plugins")
                .join(self.plugin_name())
        })
    }

    /// Check the resolved layout.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.source.is_dir() {
            diag.error(
                SOURCE,
                format!("`{}` is not an existing directory", self.source.display()),
            );
        }

        if self.build_output == self.source {
            diag.error_with_hint(
                BUILD_OUTPUT,
                "must differ from the plugin source",
                "use a subdirectory such as `dist`",
            );
        }

        let target = self.target();
        if is_within(&target, &self.source) {
            diag.error(TARGET, "must not be inside the plugin source");
        } else if is_within(&self.source, &target) {
            diag.error(TARGET, "must not contain the plugin source");
        }

        if is_within(&self.build_output, &target) || is_within(&target, &self.build_output) {
            diag.error(TARGET, "must not overlap the build output");
        }
    }

    /// Whether the build-output root is nested inside the source root.
    pub fn build_output_nested(&self) -> bool {
        is_within(&self.build_output, &self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_paths_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.source, PathBuf::from("."));
        assert_eq!(config.paths.build_output, PathBuf::from("dist"));
        assert_eq!(config.paths.runtime, PathBuf::from("wordpress-dev-env"));
        assert!(config.paths.target.is_none());
    }

    #[test]
    fn test_default_target_uses_plugin_name() {
        let paths = PathsConfig {
            source: PathBuf::from("/work/hello-dolly"),
            runtime: PathBuf::from("/work/wp"),
            ..Default::default()
        };
        assert_eq!(
            paths.target(),
            PathBuf::from("/work/wp/wp-content/plugins/hello-dolly")
        );
    }

    #[test]
    fn test_explicit_target() {
        let config = test_parse_config("[paths]\ntarget = \"/srv/plugins/x\"");
        assert_eq!(config.paths.target(), PathBuf::from("/srv/plugins/x"));
    }

    #[test]
    fn test_validate_target_inside_source() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            source: dir.path().to_path_buf(),
            build_output: dir.path().join("dist"),
            runtime: dir.path().join("wp"),
            target: Some(dir.path().join("deployed")),
        };
        let mut diag = ConfigDiagnostics::new();
        paths.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field, TARGET);
    }

    #[test]
    fn test_validate_ok_layout() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plugin");
        std::fs::create_dir(&source).unwrap();
        let paths = PathsConfig {
            build_output: source.join("dist"),
            runtime: dir.path().join("wp"),
            target: Some(dir.path().join("wp/wp-content/plugins/plugin")),
            source,
        };
        let mut diag = ConfigDiagnostics::new();
        paths.validate(&mut diag);
        assert!(diag.is_empty(), "{diag}");
        assert!(paths.build_output_nested());
    }

    #[test]
    fn test_validate_missing_source() {
        let paths = PathsConfig {
            source: PathBuf::from("/definitely/not/here"),
            build_output: PathBuf::from("/definitely/not/here/dist"),
            runtime: PathBuf::from("/tmp/wp"),
            target: None,
        };
        let mut diag = ConfigDiagnostics::new();
        paths.validate(&mut diag);
        assert!(diag.errors().iter().any(|d| d.field == SOURCE));
    }
}
