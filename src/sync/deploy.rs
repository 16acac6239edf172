//! Target-tree writes.
//!
//! Files are copied to a hidden sibling first and renamed into place, so the
//! reload notifier never observes a half-written file.

use super::error::SyncError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Suffix of in-flight copies.
pub const TEMP_SUFFIX: &str = ".wpsync";

/// Result of a successful deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployed {
    /// The destination did not exist before.
    Created,
    /// An existing destination was overwritten.
    Replaced,
    /// The source is a directory; the destination directory exists now.
    Directory,
}

/// Copy `from` to `to`, creating parent directories and overwriting `to`.
pub async fn deploy(from: &Path, to: &Path) -> Result<Deployed, SyncError> {
    let meta = fs::metadata(from).await.map_err(|source| SyncError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;

    if meta.is_dir() {
        create_dir_all(to).await?;
        return Ok(Deployed::Directory);
    }

    if let Some(parent) = to.parent() {
        create_dir_all(parent).await?;
    }

    let existed = fs::try_exists(to).await.unwrap_or(false);
    let temp = temp_path(to);

    let copied = async {
        fs::copy(from, &temp).await?;
        fs::rename(&temp, to).await
    }
    .await;

    if let Err(source) = copied {
        let _ = fs::remove_file(&temp).await;
        return Err(SyncError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        });
    }

    Ok(if existed {
        Deployed::Replaced
    } else {
        Deployed::Created
    })
}

/// Remove `path` (recursively for directories).
///
/// Returns `false` when there was nothing to remove.
pub async fn remove(path: &Path) -> Result<bool, SyncError> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(SyncError::Remove {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let removed = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match removed {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(SyncError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn create_dir_all(path: &Path) -> Result<(), SyncError> {
    fs::create_dir_all(path)
        .await
        .map_err(|source| SyncError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

/// `dir/.name.wpsync` for `dir/name`.
fn temp_path(to: &Path) -> PathBuf {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    to.with_file_name(format!(".{name}{TEMP_SUFFIX}"))
}
