//! `[bootstrap]` section configuration.
//!
//! Provisioning of the WordPress runtime stays outside wpsync: these are the
//! commands that do it.
//!
//! # Example
//!
//! ```toml
//! [bootstrap]
//! require = ["php", "wp", "npx"]
//!
//! [[bootstrap.commands]]
//! name = "core"
//! command = ["wp", "core", "download", "--path=$WPSYNC_RUNTIME", "--skip-content"]
//!
//! [[bootstrap.after_seed]]
//! command = ["wp", "plugin", "activate", "$WPSYNC_PLUGIN", "--path=$WPSYNC_RUNTIME"]
//! quiet = false
//! ```
//!
//! Unless `after_seed` is set, it activates the plugin with
//! WP-CLI. `after_seed = []` turns that off.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

const COMMANDS: FieldPath = FieldPath::new("bootstrap.commands");
const AFTER_SEED: FieldPath = FieldPath::new("bootstrap.after_seed");

/// Runtime provisioning commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Executables that must be on `PATH` before anything runs.
    pub require: Vec<String>,

    /// Run once before synchronization starts. Any failure aborts the session.
    pub commands: Vec<CommandConfig>,

    /// Run once after the initial seed has been deployed. Failures are logged.
    pub after_seed: Vec<CommandConfig>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            require: Vec::new(),
            commands: Vec::new(),
            after_seed: vec![CommandConfig {
                name: Some("activate".into()),
                command: ["wp", "plugin", "activate", "$WPSYNC_PLUGIN", "--path=$WPSYNC_RUNTIME"]
                    .map(String::from)
                    .to_vec(),
                ..CommandConfig::default()
            }],
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, list) in [(COMMANDS, &self.commands), (AFTER_SEED, &self.after_seed)] {
            for (i, cmd) in list.iter().enumerate() {
                if cmd.enable && cmd.command.is_empty() {
                    diag.error(field, format!("entry #{} has an empty command", i + 1));
                }
            }
        }
    }
}

/// A single external command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub enable: bool,

    /// Display name for logging (defaults to command[0]).
    pub name: Option<String>,

    /// Command and arguments. Supports `$WPSYNC_*` variable substitution.
    pub command: Vec<String>,

    /// Suppress output.
    pub quiet: bool,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            enable: true,
            name: None,
            command: Vec::new(),
            quiet: true,
        }
    }
}

impl CommandConfig {
    /// Returns `name` if set, otherwise falls back to `command[0]`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.command.first().map(String::as_str).unwrap_or("command"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_bootstrap_defaults() {
        let config = test_parse_config("");
        assert!(config.bootstrap.require.is_empty());
        assert!(config.bootstrap.commands.is_empty());

        let activate = &config.bootstrap.after_seed[..];
        assert_eq!(activate.len(), 1);
        assert_eq!(activate[0].display_name(), "activate");
        assert_eq!(activate[0].command[..3], ["wp", "plugin", "activate"]);
    }

    #[test]
    fn test_activation_can_be_disabled() {
        let config = test_parse_config("[bootstrap]\nafter_seed = []");
        assert!(config.bootstrap.after_seed.is_empty());
    }

    #[test]
    fn test_bootstrap_commands() {
        let config = test_parse_config(
            r#"
[bootstrap]
require = ["wp"]

[[bootstrap.commands]]
name = "core"
command = ["wp", "core", "download"]

[[bootstrap.after_seed]]
command = ["wp", "plugin", "activate", "$WPSYNC_PLUGIN"]
quiet = false
"#,
        );
        assert_eq!(config.bootstrap.require, vec!["wp"]);
        assert_eq!(config.bootstrap.commands[0].display_name(), "core");
        assert!(config.bootstrap.commands[0].quiet);

        let activate = &config.bootstrap.after_seed[0];
        assert_eq!(activate.display_name(), "wp");
        assert!(!activate.quiet);
        assert!(activate.enable);
    }

    #[test]
    fn test_empty_command_rejected() {
        let config = test_parse_config("[[bootstrap.commands]]\nname = \"nothing\"");
        let mut diag = ConfigDiagnostics::new();
        config.bootstrap.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field, COMMANDS);
    }
}
