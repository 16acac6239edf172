//! Extension-keyed build directives.
//!
//! The engine only asks "does this path need a build, and with what?"; which
//! extensions map to which compiler lives entirely in the registry.

use crate::config::{BuildSectionConfig, ProjectConfigFile};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How to turn one kind of source file into deployable artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirective {
    /// Display name for logging.
    pub name: String,
    /// Compiler command with `$WPSYNC_*` placeholders.
    pub command: Vec<String>,
    /// Extension of the produced artifact (without the dot).
    pub artifact_extension: Option<String>,
    pub project_config: Option<ProjectConfigFile>,
}

impl BuildDirective {
    /// Artifact locations a source is expected to produce, relative to the
    /// build-output root.
    ///
    /// Single-file compilers flatten into the output directory
    /// (`src/widget.ts` → `widget.js`); project-aware ones mirror the source
    /// layout (`src/widget.js`). Both are listed.
    pub fn expected_artifacts(&self, relative_source: &Path) -> Vec<PathBuf> {
        let Some(ext) = &self.artifact_extension else {
            return Vec::new();
        };

        let mirrored = relative_source.with_extension(ext);
        let mut artifacts = Vec::with_capacity(2);
        if let Some(name) = mirrored.file_name() {
            artifacts.push(PathBuf::from(name));
        }
        if mirrored.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
            artifacts.push(mirrored);
        }
        artifacts
    }
}

/// Registry from file extension to build directive.
#[derive(Debug, Default, Clone)]
pub struct TransformRegistry {
    by_extension: FxHashMap<String, Arc<BuildDirective>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for the `[build]` section.
    pub fn from_config(build: &BuildSectionConfig) -> Self {
        let mut registry = Self::new();
        for transform in &build.transforms {
            let directive = Arc::new(BuildDirective {
                name: transform.name.clone(),
                command: transform.command.clone(),
                artifact_extension: transform.artifact_extension.clone(),
                project_config: transform.project_config.clone(),
            });
            for ext in transform.normalized_extensions() {
                registry.register(&ext, Arc::clone(&directive));
            }
        }
        registry
    }

    /// Map `extension` (case-insensitive, leading dot optional) to `directive`.
    ///
    /// Returns the directive previously registered for it, if any.
    pub fn register(
        &mut self,
        extension: &str,
        directive: Arc<BuildDirective>,
    ) -> Option<Arc<BuildDirective>> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.by_extension.insert(ext, directive)
    }

    /// The directive for `path`, if its extension needs a build.
    pub fn directive_for(&self, path: &Path) -> Option<&Arc<BuildDirective>> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.by_extension.get(&ext)
    }

    pub fn needs_build(&self, path: &Path) -> bool {
        self.directive_for(path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    fn directive(name: &str, artifact: Option<&str>) -> Arc<BuildDirective> {
        Arc::new(BuildDirective {
            name: name.into(),
            command: vec![name.into(), "$WPSYNC_FILE".into()],
            artifact_extension: artifact.map(String::from),
            project_config: None,
        })
    }

    #[test]
    fn test_default_registry_builds_typescript() {
        let registry = TransformRegistry::from_config(&test_parse_config("").build);

        assert!(registry.needs_build(Path::new("/p/src/widget.ts")));
        assert!(registry.needs_build(Path::new("/p/src/Widget.TS")));
        assert!(!registry.needs_build(Path::new("/p/readme.txt")));
        assert!(!registry.needs_build(Path::new("/p/assets/app.js")));
        assert!(!registry.needs_build(Path::new("/p/Makefile")));
        assert_eq!(
            registry.directive_for(Path::new("a.ts")).map(|d| d.name.as_str()),
            Some("typescript")
        );
    }

    #[test]
    fn test_register_new_extension() {
        let mut registry = TransformRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.register(".scss", directive("sass", Some("css"))).is_none());
        assert!(registry.needs_build(Path::new("style.scss")));

        let previous = registry.register("SCSS", directive("dart-sass", Some("css")));
        assert_eq!(previous.map(|d| d.name.clone()), Some("sass".to_string()));
        assert_eq!(
            registry.directive_for(Path::new("style.scss")).map(|d| d.name.as_str()),
            Some("dart-sass")
        );
    }

    #[test]
    fn test_one_directive_many_extensions() {
        let config = test_parse_config(
            "[[build.transforms]]\nname = \"ts\"\nextensions = [\"ts\", \"tsx\"]\ncommand = [\"tsc\"]",
        );
        let registry = TransformRegistry::from_config(&config.build);
        let ts = registry.directive_for(Path::new("a.ts")).unwrap();
        let tsx = registry.directive_for(Path::new("a.tsx")).unwrap();
        assert!(Arc::ptr_eq(ts, tsx));
    }

    #[test]
    fn test_expected_artifacts() {
        let ts = directive("tsc", Some("js"));
        assert_eq!(
            ts.expected_artifacts(Path::new("src/widget.ts")),
            vec![PathBuf::from("widget.js"), PathBuf::from("src/widget.js")]
        );
        assert_eq!(
            ts.expected_artifacts(Path::new("widget.ts")),
            vec![PathBuf::from("widget.js")]
        );
        assert!(directive("x", None).expected_artifacts(Path::new("a.x")).is_empty());
    }
}
