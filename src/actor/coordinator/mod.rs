//! Actor Coordinator - Wires up the Sync Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Wires up actors
//! - Runs them concurrently until shutdown

mod runtime;
mod watch_paths;

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::SyncMsg;
use super::reload::ReloadActor;
use super::sync::SyncActor;
use crate::config::SyncConfig;
use crate::reload::client::{self, InstalledClient};
use crate::reload::server::start_ws_server;
use crate::sync::{EventBus, SyncEngine};

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<SyncConfig>,
    bus: EventBus,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Create from Arc<SyncConfig>.
    pub fn with_config(config: Arc<SyncConfig>) -> Self {
        Self {
            config,
            bus: EventBus::new(),
            shutdown_rx: None,
        }
    }

    /// Publish engine and reload events on `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (sync_tx, sync_rx) = mpsc::channel::<SyncMsg>(CHANNEL_BUFFER);

        let engine = Arc::new(SyncEngine::from_config(&self.config, self.bus.clone()));
        let sync_actor = SyncActor::new(sync_rx, engine);

        let debounce = self.config.watch.debounce();
        let mut fs_actors = Vec::new();
        for (root, filter) in watch_paths::collect_watch_roots(&self.config) {
            let actor = FsActor::new(root.clone(), filter, debounce, sync_tx.clone())
                .with_context(|| format!("failed to watch {} root {}", root.role, root.path.display()))?;
            fs_actors.push(actor);
        }

        let (reload, _client) = if self.config.serve.reload {
            let (reload, client) = self.start_reload()?;
            (Some(reload), client)
        } else {
            (None, None)
        };

        crate::log!(
            "sync";
            "{} → {}",
            self.config.paths.source.display(),
            self.config.target_root().display()
        );

        let shutdown_rx = self.shutdown_rx.take();
        runtime::run_actors(fs_actors, sync_actor, sync_tx, reload, shutdown_rx).await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }

    /// The installed client lives as long as the returned value.
    fn start_reload(&self) -> Result<(runtime::Reload, Option<InstalledClient>)> {
        let (reload_tx, reload_rx) = mpsc::channel(CHANNEL_BUFFER);

        let actor = ReloadActor::new(
            reload_rx,
            self.config.target_root(),
            self.config.serve.reload_set(),
            self.config.watch.debounce(),
            self.bus.clone(),
        )
        .context("failed to watch the deployed plugin")?;

        let port = start_ws_server(self.config.serve.port, reload_tx.clone())?;
        crate::log!("reload"; "ws://localhost:{}", port);

        let runtime = &self.config.paths.runtime;
        let installed = client::install(runtime, port)
            .with_context(|| format!("failed to install reload client in {}", runtime.display()))?;
        match &installed {
            Some(client) => crate::debug!("reload"; "client at {}", client.path().display()),
            None => crate::log!("reload"; "no wp-content in {}, browsers will not reload", runtime.display()),
        }

        Ok(((actor, reload_tx), installed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_sync_config;
    use crate::sync::SyncEvent;
    use std::time::Duration;

    #[tokio::test]
    async fn test_seeds_and_stops_on_signal() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello");
        let target = dir.path().join("wp/hello");
        std::fs::create_dir_all(source.join("includes")).unwrap();
        std::fs::write(source.join("hello.php"), "<?php").unwrap();
        std::fs::write(source.join("includes/a.php"), "<?php // a").unwrap();
        let config = Arc::new(test_sync_config(&source, &target));

        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();
        let handle = tokio::spawn(
            Coordinator::with_config(Arc::clone(&config))
                .with_event_bus(bus)
                .with_shutdown_signal(shutdown_rx)
                .run(),
        );

        let seeded = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let SyncEvent::Seeded { files } = events.recv().await.unwrap() {
                    return files;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(seeded, 2);
        let target = config.target_root();
        assert_eq!(std::fs::read(target.join("includes/a.php")).unwrap(), b"<?php // a");

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_reload_client_installed_for_session() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello");
        let runtime = dir.path().join("wp");
        std::fs::create_dir(&source).unwrap();
        std::fs::create_dir_all(runtime.join("wp-content/plugins")).unwrap();

        let mut config = test_sync_config(&source, &runtime.join("wp-content/plugins/hello"));
        config.paths.runtime = runtime.clone();
        config.serve.reload = true;
        config.serve.port = 0;

        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();
        let handle = tokio::spawn(
            Coordinator::with_config(Arc::new(config))
                .with_event_bus(bus)
                .with_shutdown_signal(shutdown_rx)
                .run(),
        );

        tokio::time::timeout(Duration::from_secs(5), async {
            while !matches!(events.recv().await, Ok(SyncEvent::Seeded { .. })) {}
        })
        .await
        .unwrap();
        let mu_plugin = runtime.join("wp-content/mu-plugins/wpsync-reload.php");
        assert!(mu_plugin.is_file());

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!mu_plugin.exists());
    }
}
