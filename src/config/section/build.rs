//! `[build]` section configuration.
//!
//! Declares which source extensions need a compile step before deployment.
//!
//! # Example
//!
//! ```toml
//! [build]
//! prune_artifacts = false     # Delete built artifacts when their source is removed
//!
//! [[build.transforms]]
//! name = "typescript"
//! extensions = ["ts"]
//! command = ["npx", "tsc", "--outDir", "$WPSYNC_BUILD_OUTPUT", "$WPSYNC_FILE"]
//! artifact_extension = "js"
//! project_config = { path = "tsconfig.json", scaffold = "tsconfig" }
//! ```
//!
//! Declaring any `[[build.transforms]]` replaces the built-in TypeScript entry.

use crate::config::{ConfigDiagnostics, FieldPath};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const TRANSFORMS: FieldPath = FieldPath::new("build.transforms");

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Remove the expected artifact when a transformable source is deleted.
    pub prune_artifacts: bool,

    /// Extension-keyed build directives.
    pub transforms: Vec<TransformConfig>,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            prune_artifacts: false,
            transforms: vec![TransformConfig::typescript()],
        }
    }
}

impl BuildSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let mut seen = FxHashSet::default();

        for transform in &self.transforms {
            if transform.command.is_empty() {
                diag.error(
                    TRANSFORMS,
                    format!("`{}` has an empty command", transform.name),
                );
            }
            if transform.extensions.is_empty() {
                diag.error(
                    TRANSFORMS,
                    format!("`{}` lists no extensions", transform.name),
                );
            }
            for ext in transform.normalized_extensions() {
                if ext.is_empty() {
                    diag.error(TRANSFORMS, format!("`{}` has an empty extension", transform.name));
                } else if !seen.insert(ext.clone()) {
                    diag.error_with_hint(
                        TRANSFORMS,
                        format!("extension `{ext}` is claimed by more than one transform"),
                        "each extension maps to exactly one build command",
                    );
                }
            }
        }
    }
}

/// One `[[build.transforms]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Display name for logging.
    pub name: String,

    /// File extensions (without the dot) that trigger this build.
    pub extensions: Vec<String>,

    /// Compiler command. Supports `$WPSYNC_*` variable substitution.
    pub command: Vec<String>,

    /// Extension of the produced artifact, used to prune stale output.
    #[serde(default)]
    pub artifact_extension: Option<String>,

    /// Project config file handed to the compiler.
    #[serde(default)]
    pub project_config: Option<ProjectConfigFile>,
}

impl TransformConfig {
    /// Built-in TypeScript transform.
    ///
    /// `tsc <file>` ignores `tsconfig.json`, so the output directory is passed
    /// on the command line as well.
    pub fn typescript() -> Self {
        Self {
            name: "typescript".into(),
            extensions: vec!["ts".into()],
            command: [
                "npx",
                "tsc",
                "--noEmitOnError",
                "--target",
                "ES2018",
                "--module",
                "commonjs",
                "--strict",
                "--outDir",
                "$WPSYNC_BUILD_OUTPUT",
                "$WPSYNC_FILE",
            ]
            .map(String::from)
            .to_vec(),
            artifact_extension: Some("js".into()),
            project_config: Some(ProjectConfigFile {
                path: PathBuf::from("tsconfig.json"),
                scaffold: Some(Scaffold::Tsconfig),
            }),
        }
    }

    /// Extensions lowercased, leading dot stripped.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }
}

/// Project config file for a transform (e.g. `tsconfig.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfigFile {
    /// Path relative to the source root.
    pub path: PathBuf,

    /// Template written when the file is missing. `None` never writes.
    #[serde(default)]
    pub scaffold: Option<Scaffold>,
}

/// Built-in project config templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scaffold {
    Tsconfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert!(!config.build.prune_artifacts);
        assert_eq!(config.build.transforms.len(), 1);

        let ts = &config.build.transforms[0];
        assert_eq!(ts.name, "typescript");
        assert_eq!(ts.extensions, vec!["ts"]);
        assert_eq!(ts.artifact_extension.as_deref(), Some("js"));
        assert!(ts.command.iter().any(|arg| arg == "$WPSYNC_FILE"));
        assert_eq!(
            ts.project_config.as_ref().and_then(|p| p.scaffold),
            Some(Scaffold::Tsconfig)
        );
    }

    #[test]
    fn test_custom_transforms_replace_default() {
        let config = test_parse_config(
            r#"
[build]
prune_artifacts = true

[[build.transforms]]
name = "sass"
extensions = [".scss", "SASS"]
command = ["sass", "$WPSYNC_FILE", "$WPSYNC_BUILD_OUTPUT/style.css"]
artifact_extension = "css"
"#,
        );
        assert!(config.build.prune_artifacts);
        assert_eq!(config.build.transforms.len(), 1);

        let sass = &config.build.transforms[0];
        assert_eq!(sass.normalized_extensions(), vec!["scss", "sass"]);
        assert!(sass.project_config.is_none());
    }

    #[test]
    fn test_validate_duplicate_extension() {
        let mut section = BuildSectionConfig::default();
        section.transforms.push(TransformConfig {
            name: "other".into(),
            extensions: vec![".TS".into()],
            command: vec!["other".into()],
            artifact_extension: None,
            project_config: None,
        });

        let mut diag = ConfigDiagnostics::new();
        section.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert!(diag.errors()[0].message.contains("`ts`"));
    }

    #[test]
    fn test_validate_empty_command() {
        let section = BuildSectionConfig {
            prune_artifacts: false,
            transforms: vec![TransformConfig {
                name: "broken".into(),
                extensions: vec!["coffee".into()],
                command: vec![],
                artifact_extension: None,
                project_config: None,
            }],
        };
        let mut diag = ConfigDiagnostics::new();
        section.validate(&mut diag);
        assert!(!diag.is_empty());
    }
}
