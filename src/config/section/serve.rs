//! `[serve]` section configuration.
//!
//! Contains the WordPress dev server and live reload settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! port = 3000                 # Live reload WebSocket port
//! wp_port = 8080              # WordPress dev server port
//! reload = true               # Notify browsers when deployed files change
//! reload_globs = ["**/*.php", "**/*.js", "**/*.css"]
//! server = ["php", "-S", "localhost:$WPSYNC_WP_PORT", "-t", "."]
//! server_enable = true        # Spawn `server` inside the runtime directory
//! ```

use super::watch::build_globset;
use crate::config::{ConfigDiagnostics, FieldPath};
use globset::{Glob, GlobSet};
use serde::{Deserialize, Serialize};

const PORT: FieldPath = FieldPath::new("serve.port");
const RELOAD_GLOBS: FieldPath = FieldPath::new("serve.reload_globs");
const SERVER: FieldPath = FieldPath::new("serve.server");

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Live reload WebSocket port.
    pub port: u16,

    /// WordPress dev server port.
    pub wp_port: u16,

    /// Enable the reload notifier.
    pub reload: bool,

    /// Deployed files that trigger a browser reload.
    pub reload_globs: Vec<String>,

    /// Dev server command, run with the runtime directory as cwd.
    pub server: Vec<String>,

    /// Spawn `server` for the session.
    pub server_enable: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            wp_port: 8080,
            reload: true,
            reload_globs: vec!["**/*.php".into(), "**/*.js".into(), "**/*.css".into()],
            server: ["php", "-S", "localhost:$WPSYNC_WP_PORT", "-t", "."]
                .map(String::from)
                .to_vec(),
            server_enable: true,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == self.wp_port {
            diag.error_with_hint(
                PORT,
                format!("reload port {} clashes with `serve.wp_port`", self.port),
                "use two different ports",
            );
        }
        for pattern in &self.reload_globs {
            if let Err(e) = Glob::new(pattern) {
                diag.error(RELOAD_GLOBS, format!("invalid glob `{pattern}`: {e}"));
            }
        }
        if self.server_enable && self.server.is_empty() {
            diag.error_with_hint(
                SERVER,
                "dev server is enabled but no command is set",
                "set `server_enable = false` to manage the server yourself",
            );
        }
    }

    pub fn reload_set(&self) -> GlobSet {
        build_globset(&self.reload_globs)
    }
}
