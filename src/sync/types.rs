//! Watch roots and the events flowing between them.

use std::fmt;
use std::path::PathBuf;

/// Which tree a watched root is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootRole {
    /// The plugin source the developer edits.
    Primary,
    /// Where the external compiler writes artifacts.
    BuildOutput,
}

impl RootRole {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "source",
            Self::BuildOutput => "build-output",
        }
    }
}

impl fmt::Display for RootRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A watched directory and its role for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub role: RootRole,
}

impl WatchRoot {
    pub fn new(path: impl Into<PathBuf>, role: RootRole) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }
}

/// Kind of filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// A classified change under one of the watch roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Absolute path.
    pub path: PathBuf,
    pub root: RootRole,
    /// Synthesized by the initial scan rather than observed live.
    pub initial: bool,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>, root: RootRole) -> Self {
        Self {
            kind,
            path: path.into(),
            root,
            initial: false,
        }
    }

    /// Event for a file found by the initial scan.
    pub fn initial(path: impl Into<PathBuf>, root: RootRole) -> Self {
        Self {
            initial: true,
            ..Self::new(ChangeKind::Created, path, root)
        }
    }
}

/// What happened to an artifact in the build-output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactChange {
    Produced,
    Updated,
    Removed,
}

/// Second pipeline stage: an artifact appeared, changed or went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEvent {
    pub change: ArtifactChange,
    /// Absolute path inside the build-output root.
    pub path: PathBuf,
    pub initial: bool,
}

impl TryFrom<ChangeEvent> for ArtifactEvent {
    type Error = ChangeEvent;

    /// Only build-output events describe artifacts; others are handed back.
    fn try_from(event: ChangeEvent) -> Result<Self, Self::Error> {
        if event.root != RootRole::BuildOutput {
            return Err(event);
        }
        let change = match event.kind {
            ChangeKind::Created => ArtifactChange::Produced,
            ChangeKind::Modified => ArtifactChange::Updated,
            ChangeKind::Removed => ArtifactChange::Removed,
        };
        Ok(Self {
            change,
            path: event.path,
            initial: event.initial,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_from_build_output_event() {
        let event = ChangeEvent::new(ChangeKind::Modified, "/p/dist/app.js", RootRole::BuildOutput);
        let artifact = ArtifactEvent::try_from(event).unwrap();
        assert_eq!(artifact.change, ArtifactChange::Updated);
        assert_eq!(artifact.path, PathBuf::from("/p/dist/app.js"));
        assert!(!artifact.initial);
    }

    #[test]
    fn test_primary_event_is_not_an_artifact() {
        let event = ChangeEvent::initial("/p/readme.txt", RootRole::Primary);
        let back = ArtifactEvent::try_from(event.clone()).unwrap_err();
        assert_eq!(back, event);
        assert_eq!(back.kind, ChangeKind::Created);
        assert!(back.initial);
    }
}
