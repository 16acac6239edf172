//! Errors raised while mirroring a single path.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A failed target-tree mutation. Never fatal to the session.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to copy `{}` to `{}`: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create `{}`: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove `{}`: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
