//! `start` and `sync` commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::SyncConfig;
use crate::core::register_session;
use crate::session::Session;

/// Bootstrap the runtime, start the dev server and sync until Ctrl+C.
pub fn start(config: SyncConfig) -> Result<()> {
    run_session(config, true)
}

/// Mirror the plugin into the target directory until Ctrl+C.
pub fn sync(config: SyncConfig) -> Result<()> {
    run_session(config, false)
}

fn run_session(config: SyncConfig, bootstrap: bool) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();
    register_session(shutdown_tx);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create async runtime")?;

    runtime.block_on(
        Session::new(Arc::new(config))
            .with_bootstrap(bootstrap)
            .run(shutdown_rx),
    )
}
