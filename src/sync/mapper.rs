//! Source and artifact paths to deployed paths.

use super::types::RootRole;
use crate::utils::path::strip_root;
use std::path::{Path, PathBuf};

/// Maps paths under the watched roots to the deployed plugin tree.
///
/// Pure and total: the part of a path below its root is re-rooted under the
/// target unchanged. A path outside its root keeps its normal components.
#[derive(Debug, Clone)]
pub struct PathMapper {
    source: PathBuf,
    build_output: PathBuf,
    target: PathBuf,
}

impl PathMapper {
    pub fn new(
        source: impl Into<PathBuf>,
        build_output: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            build_output: build_output.into(),
            target: target.into(),
        }
    }

    /// Deployed location of `path`, taken relative to `role`'s root.
    pub fn map(&self, path: &Path, role: RootRole) -> PathBuf {
        self.target.join(self.relative(path, role))
    }

    /// `path` relative to `role`'s root.
    pub fn relative(&self, path: &Path, role: RootRole) -> PathBuf {
        strip_root(path, self.root(role))
    }

    pub fn root(&self, role: RootRole) -> &Path {
        match role {
            RootRole::Primary => &self.source,
            RootRole::BuildOutput => &self.build_output,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}
