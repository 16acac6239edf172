//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live plugin sync for local WordPress development
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: wpsync.toml, searched upward from cwd)
    #[arg(short = 'C', long, default_value = "wpsync.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Bootstrap the runtime, start the dev server and keep the plugin in sync
    #[command(visible_alias = "s")]
    Start {
        #[command(flatten)]
        sync_args: SyncArgs,

        /// Live reload WebSocket port
        #[arg(short, long)]
        port: Option<u16>,

        /// WordPress dev server port
        #[arg(short, long)]
        wp_port: Option<u16>,

        /// Do not spawn the WordPress dev server
        #[arg(long)]
        no_server: bool,

        /// Disable the live reload notifier
        #[arg(long)]
        no_reload: bool,
    },

    /// Only mirror the plugin into the target directory
    #[command(visible_alias = "y")]
    Sync {
        #[command(flatten)]
        sync_args: SyncArgs,

        /// Deployed plugin directory (default: <runtime>/wp-content/plugins/<plugin>)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        target: Option<PathBuf>,
    },
}

/// Shared arguments for Start and Sync
#[derive(clap::Args, Debug, Clone)]
pub struct SyncArgs {
    /// Plugin source directory (default: `paths.source` or the current directory)
    #[arg(value_name = "PLUGIN_PATH", value_hint = clap::ValueHint::DirPath)]
    pub plugin: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn sync_args(&self) -> &SyncArgs {
        match &self.command {
            Commands::Start { sync_args, .. } | Commands::Sync { sync_args, .. } => sync_args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let cli = Cli::try_parse_from([
            "wpsync", "start", "./my-plugin", "-p", "35729", "--no-server", "-V",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Start { .. }));
        assert_eq!(cli.config, PathBuf::from("wpsync.toml"));
        assert_eq!(cli.sync_args().plugin, Some(PathBuf::from("./my-plugin")));
        assert!(cli.sync_args().verbose);
        match cli.command {
            Commands::Start {
                port,
                wp_port,
                no_server,
                no_reload,
                ..
            } => {
                assert_eq!(port, Some(35729));
                assert_eq!(wp_port, None);
                assert!(no_server);
                assert!(!no_reload);
            }
            Commands::Sync { .. } => panic!("expected start"),
        }
    }

    #[test]
    fn test_parse_sync_with_target() {
        let cli = Cli::try_parse_from(["wpsync", "-C", "ci.toml", "sync", "-t", "/srv/plugin"])
            .unwrap();

        assert!(matches!(cli.command, Commands::Sync { .. }));
        assert_eq!(cli.config, PathBuf::from("ci.toml"));
        assert_eq!(cli.sync_args().plugin, None);
        match cli.command {
            Commands::Sync { target, .. } => assert_eq!(target, Some(PathBuf::from("/srv/plugin"))),
            Commands::Start { .. } => panic!("expected sync"),
        }
    }
}
