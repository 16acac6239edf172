//! Path utilities.
//!
//! Pure functions for path manipulation, plus `normalize_path` which may
//! consult the filesystem to canonicalize.
//!
//! - [`fs`]: normalization and root-relative helpers

pub mod fs;

pub use fs::{clean_path, has_hidden_component, is_within, normalize_path, strip_root};
