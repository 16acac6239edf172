//! Sync Engine: applies classified events to the deployed plugin tree.
//!
//! | Root         | Event            | Action                                  |
//! |--------------|------------------|-----------------------------------------|
//! | primary      | created/modified | copy, or build if transformable          |
//! | primary      | removed          | remove mapped target (+ prune, opt-in)   |
//! | build-output | produced/updated | copy                                     |
//! | build-output | removed          | remove mapped target                     |
//!
//! A handler's failure is published and forgotten; it never stops the engine.

use super::build::{BuildOutcome, BuildRunner};
use super::deploy::{self, Deployed};
use super::error::SyncError;
use super::event::{EventBus, SyncEvent};
use super::mapper::PathMapper;
use super::transform::{BuildDirective, TransformRegistry};
use super::types::{ArtifactChange, ArtifactEvent, ChangeEvent, ChangeKind, RootRole};
use crate::bootstrap::session_vars;
use crate::config::SyncConfig;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Lifecycle of a watched root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootPhase {
    AwaitingInitialScan,
    Idle,
}

/// What handling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Copied to `target`; `created` if nothing was there before.
    Deployed { target: PathBuf, created: bool },
    /// A directory now exists at `target`.
    DirectoryMirrored { target: PathBuf },
    Removed { target: PathBuf },
    /// Removal requested, nothing was deployed there.
    NothingToRemove,
    /// Transformable source compiled; its artifacts follow as separate events.
    Built,
    BuildFailed(String),
    /// Stale artifacts deleted from the build-output root.
    Pruned(Vec<PathBuf>),
    /// Dropped without touching the target (e.g. stale initial artifacts).
    Suppressed,
    Failed(String),
}

/// Everything the engine needs for a session.
pub struct SyncEngine {
    mapper: PathMapper,
    transforms: TransformRegistry,
    builder: BuildRunner,
    bus: EventBus,
    prune_artifacts: bool,
    primary: Mutex<RootPhase>,
    build_output: Mutex<RootPhase>,
}

impl SyncEngine {
    pub fn new(
        mapper: PathMapper,
        transforms: TransformRegistry,
        builder: BuildRunner,
        bus: EventBus,
    ) -> Self {
        Self {
            mapper,
            transforms,
            builder,
            bus,
            prune_artifacts: false,
            primary: Mutex::new(RootPhase::AwaitingInitialScan),
            build_output: Mutex::new(RootPhase::AwaitingInitialScan),
        }
    }

    /// Engine for a resolved session config.
    pub fn from_config(config: &SyncConfig, bus: EventBus) -> Self {
        let paths = &config.paths;
        let mapper = PathMapper::new(&paths.source, &paths.build_output, config.target_root());
        let builder = BuildRunner::new(&paths.source, &paths.build_output, session_vars(config));

        Self::new(
            mapper,
            TransformRegistry::from_config(&config.build),
            builder,
            bus,
        )
        .with_prune_artifacts(config.build.prune_artifacts)
    }

    /// Delete expected artifacts when a transformable source is removed.
    pub fn with_prune_artifacts(mut self, prune: bool) -> Self {
        self.prune_artifacts = prune;
        self
    }

    #[cfg(test)]
    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn phase(&self, role: RootRole) -> RootPhase {
        *self.phase_slot(role).lock()
    }

    /// The root's initial scan has been delivered; later events are live.
    pub fn scan_complete(&self, role: RootRole) {
        *self.phase_slot(role).lock() = RootPhase::Idle;
    }

    fn phase_slot(&self, role: RootRole) -> &Mutex<RootPhase> {
        match role {
            RootRole::Primary => &self.primary,
            RootRole::BuildOutput => &self.build_output,
        }
    }

    // ========================================================================
    // Primary source root
    // ========================================================================

    /// Handle a change under the primary source root.
    pub async fn handle_source(&self, event: ChangeEvent) -> SyncOutcome {
        debug_assert_eq!(event.root, RootRole::Primary);

        match event.kind {
            ChangeKind::Created | ChangeKind::Modified
                if !event.path.is_dir() && self.transforms.needs_build(&event.path) =>
            {
                self.build(&event.path).await
            }
            ChangeKind::Created | ChangeKind::Modified => {
                self.copy(&event.path, RootRole::Primary).await
            }
            ChangeKind::Removed => {
                let outcome = self.remove(&event.path, RootRole::Primary).await;
                match self.transforms.directive_for(&event.path) {
                    Some(directive) if self.prune_artifacts => {
                        self.prune(&event.path, directive).await.unwrap_or(outcome)
                    }
                    _ => outcome,
                }
            }
        }
    }

    async fn build(&self, path: &Path) -> SyncOutcome {
        let Some(directive) = self.transforms.directive_for(path) else {
            return SyncOutcome::Suppressed;
        };
        let relative = self.mapper.relative(path, RootRole::Primary);
        self.bus.publish(SyncEvent::BuildStarted {
            path: relative.clone(),
            transform: directive.name.clone(),
        });

        let started = Instant::now();
        match self.builder.build(path, directive).await {
            BuildOutcome::Succeeded => {
                self.bus.publish(SyncEvent::Built {
                    path: relative,
                    transform: directive.name.clone(),
                    elapsed: started.elapsed(),
                });
                SyncOutcome::Built
            }
            BuildOutcome::Failed(reason) => {
                self.bus.publish(SyncEvent::BuildFailed {
                    path: relative,
                    transform: directive.name.clone(),
                    reason: reason.clone(),
                });
                SyncOutcome::BuildFailed(reason)
            }
        }
    }

    /// Delete the artifacts `source` is expected to have produced.
    ///
    /// Their own removal events clean the target. Returns `None` when there
    /// was nothing to prune.
    async fn prune(&self, source: &Path, directive: &BuildDirective) -> Option<SyncOutcome> {
        let relative = self.mapper.relative(source, RootRole::Primary);
        let output_root = self.mapper.root(RootRole::BuildOutput);

        let mut pruned = Vec::new();
        for artifact in directive.expected_artifacts(&relative) {
            let path = output_root.join(&artifact);
            match deploy::remove(&path).await {
                Ok(true) => pruned.push(artifact),
                Ok(false) => {}
                Err(e) => self.report(&path, RootRole::BuildOutput, &e),
            }
        }

        if pruned.is_empty() {
            return None;
        }
        self.bus.publish(SyncEvent::Pruned {
            source: relative,
            artifacts: pruned.clone(),
        });
        Some(SyncOutcome::Pruned(pruned))
    }

    // ========================================================================
    // Build-output root
    // ========================================================================

    /// Handle an artifact change under the build-output root.
    pub async fn handle_artifact(&self, event: ArtifactEvent) -> SyncOutcome {
        if event.initial && self.phase(RootRole::BuildOutput) == RootPhase::AwaitingInitialScan {
            return SyncOutcome::Suppressed;
        }

        match event.change {
            ArtifactChange::Produced | ArtifactChange::Updated => {
                self.copy(&event.path, RootRole::BuildOutput).await
            }
            ArtifactChange::Removed => self.remove(&event.path, RootRole::BuildOutput).await,
        }
    }

    // ========================================================================
    // Shared copy/remove
    // ========================================================================

    async fn copy(&self, path: &Path, role: RootRole) -> SyncOutcome {
        let target = self.mapper.map(path, role);
        let relative = self.mapper.relative(path, role);

        match deploy::deploy(path, &target).await {
            Ok(Deployed::Directory) => SyncOutcome::DirectoryMirrored { target },
            Ok(deployed) => {
                let created = deployed == Deployed::Created;
                self.bus.publish(if created {
                    SyncEvent::Added { path: relative }
                } else {
                    SyncEvent::Updated { path: relative }
                });
                SyncOutcome::Deployed { target, created }
            }
            Err(e) => {
                self.report(path, role, &e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    async fn remove(&self, path: &Path, role: RootRole) -> SyncOutcome {
        let target = self.mapper.map(path, role);

        // Never delete the whole deployed plugin because its source root vanished
        if target == self.mapper.target() {
            return SyncOutcome::NothingToRemove;
        }

        match deploy::remove(&target).await {
            Ok(true) => {
                self.bus.publish(SyncEvent::Removed {
                    path: self.mapper.relative(path, role),
                });
                SyncOutcome::Removed { target }
            }
            Ok(false) => SyncOutcome::NothingToRemove,
            Err(e) => {
                self.report(path, role, &e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    fn report(&self, path: &Path, role: RootRole, error: &SyncError) {
        self.bus.publish(SyncEvent::Error {
            path: self.mapper.relative(path, role),
            message: error.to_string(),
        });
    }
}
