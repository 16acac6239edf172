//! Build Runner: one external compiler process per transformable source.
//!
//! The runner only guarantees the compiler ran and exited. Artifacts reach the
//! target through the build-output watcher, never through the runner.

mod project;

use super::transform::BuildDirective;
use crate::bootstrap::resolve_args;
use crate::utils::exec::{Cmd, OutputFilter};
use crate::utils::path::{is_within, strip_root};
use crate::{debug, log};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Result of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded,
    Failed(String),
}

/// Runs build directives with the primary source root as cwd.
pub struct BuildRunner {
    source_root: PathBuf,
    build_output: PathBuf,
    vars: FxHashMap<String, String>,
    /// Project configs already checked this session.
    checked: Mutex<FxHashSet<PathBuf>>,
}

impl BuildRunner {
    /// `vars` are the session `$WPSYNC_*` variables.
    pub fn new(
        source_root: impl Into<PathBuf>,
        build_output: impl Into<PathBuf>,
        vars: FxHashMap<String, String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            build_output: build_output.into(),
            vars,
            checked: Mutex::new(FxHashSet::default()),
        }
    }

    /// Compile `path`, suspending until the compiler exits.
    ///
    /// Dropping the returned future kills the compiler.
    pub async fn build(&self, path: &Path, directive: &BuildDirective) -> BuildOutcome {
        let config = match self.ensure_project_config(directive).await {
            Ok(config) => config,
            Err(e) => return BuildOutcome::Failed(e.to_string()),
        };

        let mut vars = self.vars.clone();
        let relative = strip_root(path, &self.source_root);
        vars.insert("WPSYNC_FILE".into(), relative.display().to_string());
        vars.insert(
            "WPSYNC_CONFIG".into(),
            config.map(|p| p.display().to_string()).unwrap_or_default(),
        );

        let args = resolve_args(&directive.command, &vars);
        debug!("build"; "{}", args.join(" "));

        let result = Cmd::from_slice(&args)
            .cwd(&self.source_root)
            .envs(&vars)
            .filter(OutputFilter::NPM)
            .run_async()
            .await;

        match result {
            Ok(_) => BuildOutcome::Succeeded,
            Err(e) => BuildOutcome::Failed(format!("{e:#}")),
        }
    }

    /// Write the directive's project config if it is missing.
    ///
    /// Each config path is checked once per session; later edits or
    /// deletions by the user are left alone.
    async fn ensure_project_config(
        &self,
        directive: &BuildDirective,
    ) -> std::io::Result<Option<PathBuf>> {
        let Some(file) = &directive.project_config else {
            return Ok(None);
        };
        let path = self.source_root.join(&file.path);

        let mut checked = self.checked.lock().await;
        if checked.contains(&path) {
            return Ok(Some(path));
        }

        if let Some(scaffold) = file.scaffold
            && !tokio::fs::try_exists(&path).await?
        {
            let out_dir = if is_within(&self.build_output, &self.source_root) {
                strip_root(&self.build_output, &self.source_root)
            } else {
                self.build_output.clone()
            };
            tokio::fs::write(&path, project::render(scaffold, &out_dir)).await?;
            log!("build"; "created {}", file.path.display());
        }

        // A failed write is retried by the next build
        checked.insert(path.clone());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectConfigFile, Scaffold};

    fn directive(command: &[&str], project: Option<ProjectConfigFile>) -> BuildDirective {
        BuildDirective {
            name: "test".into(),
            command: command.iter().map(|s| s.to_string()).collect(),
            artifact_extension: Some("js".into()),
            project_config: project,
        }
    }

    fn tsconfig_project() -> Option<ProjectConfigFile> {
        Some(ProjectConfigFile {
            path: PathBuf::from("tsconfig.json"),
            scaffold: Some(Scaffold::Tsconfig),
        })
    }

    #[tokio::test]
    async fn test_project_config_synthesized_once() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BuildRunner::new(dir.path(), dir.path().join("dist"), FxHashMap::default());
        let directive = directive(&["true"], tsconfig_project());
        let tsconfig = dir.path().join("tsconfig.json");

        let first = runner.ensure_project_config(&directive).await.unwrap();
        assert_eq!(first, Some(tsconfig.clone()));
        assert!(std::fs::read_to_string(&tsconfig).unwrap().contains("./dist"));

        // Not recreated within the same session
        std::fs::remove_file(&tsconfig).unwrap();
        runner.ensure_project_config(&directive).await.unwrap();
        assert!(!tsconfig.exists());
    }

    #[tokio::test]
    async fn test_existing_project_config_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let tsconfig = dir.path().join("tsconfig.json");
        std::fs::write(&tsconfig, "{\"custom\": true}").unwrap();

        let runner = BuildRunner::new(dir.path(), dir.path().join("dist"), FxHashMap::default());
        runner
            .ensure_project_config(&directive(&["true"], tsconfig_project()))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&tsconfig).unwrap(), "{\"custom\": true}");
    }

    #[tokio::test]
    async fn test_failed_scaffold_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BuildRunner::new(dir.path(), dir.path().join("dist"), FxHashMap::default());
        let directive = directive(
            &["true"],
            Some(ProjectConfigFile {
                path: PathBuf::from("config/tsconfig.json"),
                scaffold: Some(Scaffold::Tsconfig),
            }),
        );

        assert!(runner.ensure_project_config(&directive).await.is_err());

        std::fs::create_dir(dir.path().join("config")).unwrap();
        runner.ensure_project_config(&directive).await.unwrap();
        assert!(dir.path().join("config/tsconfig.json").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_outside_build_output_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plugin");
        let out = dir.path().join("out");
        std::fs::create_dir(&source).unwrap();

        let runner = BuildRunner::new(&source, &out, FxHashMap::default());
        runner
            .ensure_project_config(&directive(&["true"], tsconfig_project()))
            .await
            .unwrap();

        let text = std::fs::read_to_string(source.join("tsconfig.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["compilerOptions"]["outDir"], out.display().to_string());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_substitutes_file_and_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        let source = dir.path().join("src/app.ts");
        std::fs::write(&source, "let a = 1;").unwrap();

        let runner = BuildRunner::new(dir.path(), dir.path().join("dist"), FxHashMap::default());
        let directive = directive(
            &["sh", "-c", "printf '%s %s' \"$1\" \"$2\" > out.txt", "sh", "$WPSYNC_FILE", "$WPSYNC_CONFIG"],
            tsconfig_project(),
        );

        let outcome = runner.build(&source, &directive).await;
        assert_eq!(outcome, BuildOutcome::Succeeded);

        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        let expected = format!("src/app.ts {}", dir.path().join("tsconfig.json").display());
        assert_eq!(out, expected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_failure_reports_compiler_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BuildRunner::new(dir.path(), dir.path().join("dist"), FxHashMap::default());
        let directive = directive(
            &["sh", "-c", "echo 'app.ts(1,5): error TS2322'; exit 2"],
            None,
        );

        match runner.build(&dir.path().join("app.ts"), &directive).await {
            BuildOutcome::Failed(reason) => assert!(reason.contains("TS2322")),
            BuildOutcome::Succeeded => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_build_missing_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BuildRunner::new(dir.path(), dir.path().join("dist"), FxHashMap::default());
        let outcome = runner
            .build(&dir.path().join("a.ts"), &directive(&["wpsync-missing-tsc"], None))
            .await;
        assert!(matches!(outcome, BuildOutcome::Failed(_)));
    }
}
