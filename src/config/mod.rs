//! `wpsync.toml` and the CLI, merged into one [`SyncConfig`].
//!
//! The file is optional and every field has a default. Sections live in
//! [`section`], each validating its own fields into a shared
//! [`ConfigDiagnostics`] so a broken file reports every problem at once.
//!
//! Relative paths in the file resolve against the file's directory; paths
//! given on the command line resolve against cwd.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_path};

pub use section::{
    BootstrapConfig, BuildSectionConfig, CommandConfig, PathsConfig, ProjectConfigFile, Scaffold,
    ServeConfig, WatchConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands},
    log,
    utils::path::normalize_path,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Looked up from cwd upward unless `--config` names another file.
pub const CONFIG_FILE: &str = "wpsync.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// The file this config came from, if any
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory of the config file, or cwd without one
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Parsed file contents plus the keys serde skipped.
struct Parsed {
    config: SyncConfig,
    unknown: Vec<String>,
}

impl SyncConfig {
    /// Read, merge with `cli` and validate.
    ///
    /// No config file is fine, unless `--config` asked for one.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;

        let found = find_config_file(&cli.config);
        if found.is_none() && cli.config != Path::new(CONFIG_FILE) {
            bail!(ConfigError::Validation(format!(
                "config file `{}` not found",
                cli.config.display()
            )));
        }

        let mut config = match found {
            Some(path) => Self::read(&path)?,
            None => Self::default(),
        };
        if config.root.as_os_str().is_empty() {
            config.root = cwd.clone();
        }

        config.finalize(cli, &cwd);
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let Parsed { mut config, unknown } = Self::parse(&text)?;

        if !unknown.is_empty() {
            log!("config"; "ignoring unknown key(s) in {}: {}", path.display(), unknown.join(", "));
        }
        config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.config_path = Some(normalize_path(path));
        Ok(config)
    }

    fn parse(text: &str) -> Result<Parsed, ConfigError> {
        let mut unknown = Vec::new();
        let config = serde_ignored::deserialize(toml::Deserializer::new(text), |key| {
            unknown.push(key.to_string());
        })?;
        Ok(Parsed { config, unknown })
    }

    /// Plugin directory name.
    pub fn plugin_name(&self) -> String {
        self.paths.plugin_name()
    }

    /// Deployed plugin root.
    pub fn target_root(&self) -> PathBuf {
        self.paths.target()
    }

    /// Make every path absolute and let the command line win.
    fn finalize(&mut self, cli: &Cli, cwd: &Path) {
        let root = normalize_path(&self.root);
        self.root = root.clone();

        let args = cli.sync_args();
        crate::logger::set_verbose(args.verbose);

        self.paths.source = match &args.plugin {
            Some(plugin) => normalize_path(&resolve_path(plugin, cwd)),
            None => normalize_path(&resolve_path(&self.paths.source, &root)),
        };
        self.paths.build_output =
            normalize_path(&resolve_path(&self.paths.build_output, &self.paths.source));
        self.paths.runtime = normalize_path(&resolve_path(&self.paths.runtime, &root));
        self.paths.target = match (&cli.command, &self.paths.target) {
            (Commands::Sync { target: Some(t), .. }, _) => Some(normalize_path(&resolve_path(t, cwd))),
            (_, Some(t)) => Some(normalize_path(&resolve_path(t, &root))),
            (_, None) => None,
        };
        self.paths.target = Some(self.paths.target());

        match &cli.command {
            Commands::Start {
                port,
                wp_port,
                no_server,
                no_reload,
                ..
            } => {
                if let Some(port) = port {
                    self.serve.port = *port;
                }
                if let Some(wp_port) = wp_port {
                    self.serve.wp_port = *wp_port;
                }
                self.serve.server_enable &= !no_server;
                self.serve.reload &= !no_reload;
            }
            // One-shot mirror: nothing to serve or reload
            Commands::Sync { .. } => {
                self.serve.server_enable = false;
                self.serve.reload = false;
            }
        }
    }

    /// Check the resolved config, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.paths.validate(&mut diag);
        self.build.validate(&mut diag);
        self.watch.validate(&mut diag);
        self.serve.validate(&mut diag);
        self.bootstrap.validate(&mut diag);
        Ok(diag.into_result().map_err(ConfigError::Diagnostics)?)
    }
}

/// Parse config text, failing on any key serde would skip.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SyncConfig {
    let Parsed { config, unknown } = SyncConfig::parse(content).unwrap();
    assert_eq!(unknown, Vec::<String>::new(), "typo in test config");
    config
}

/// Resolved config for a plugin directory, as `wpsync sync <plugin> -t <target>` would build it.
#[cfg(test)]
pub fn test_sync_config(source: &Path, target: &Path) -> SyncConfig {
    use clap::Parser;

    let cli = Cli::try_parse_from([
        Path::new("wpsync"),
        Path::new("sync"),
        source,
        Path::new("--target"),
        target,
    ])
    .unwrap();
    let mut config = SyncConfig {
        root: source.to_path_buf(),
        ..SyncConfig::default()
    };
    config.finalize(&cli, source);
    config
}
