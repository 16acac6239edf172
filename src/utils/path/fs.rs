//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + lexical fallback)
//! - `clean_path` - lexical `.`/`..` resolution, no I/O
//! - `strip_root` - total root-relative path computation
//! - `is_within` / `has_hidden_component` - lexical checks used by the watchers

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`). A path that
/// does not exist yet is made absolute against cwd and cleaned lexically.
///
/// # Example
/// ```ignore
/// let abs = normalize_path(Path::new("./my-plugin"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            clean_path(path)
        } else {
            std::env::current_dir().map_or_else(|_| clean_path(path), |cwd| clean_path(&cwd.join(path)))
        }
    })
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// `..` past the root is dropped; symlinks are not followed.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Path of `path` relative to `root`.
///
/// Never fails: when `path` is not below `root`, the root, drive prefix and
/// any `.`/`..` components are dropped and the remaining normal components
/// are returned. `root` itself maps to an empty path.
pub fn strip_root(path: &Path, root: &Path) -> PathBuf {
    if let Ok(rel) = path.strip_prefix(root) {
        return rel.to_path_buf();
    }

    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Whether `path` is `base` or lies beneath it (lexical, no I/O).
#[inline]
pub fn is_within(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Whether any component of a (root-relative) path starts with a dot.
pub fn has_hidden_component(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
