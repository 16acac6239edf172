//! Dotted `wpsync.toml` key that a diagnostic points at.

/// A key such as `paths.target` or `build.transforms`.
///
/// ```ignore
/// const TARGET: FieldPath = FieldPath::new("paths.target");
/// diag.error(TARGET, "must not be inside the plugin source");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// The `[section]` the key lives in.
    pub fn section(self) -> &'static str {
        self.0.split('.').next().unwrap_or(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section() {
        assert_eq!(FieldPath::new("paths.target").section(), "paths");
        assert_eq!(FieldPath::new("serve").section(), "serve");
    }
}
