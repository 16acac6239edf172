//! wpsync - Live plugin sync for local WordPress development.

mod actor;
mod bootstrap;
mod cli;
mod config;
mod core;
mod logger;
mod reload;
mod session;
mod sync;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SyncConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SyncConfig::load(&cli)?;

    match &cli.command {
        Commands::Start { .. } => cli::start::start(config),
        Commands::Sync { .. } => cli::start::sync(config),
    }
}
