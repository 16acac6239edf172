//! Session context.
//!
//! A session owns everything started for one `wpsync start`/`sync` run:
//! the dev server, the actor system and the event subscribers. Whatever way
//! the session ends, dropping it stops them all.
//!
//! ```text
//! requirements → bootstrap commands → dev server → actors ─┬─ console
//!                                                          └─ after-seed commands
//! ```

mod process;

pub use process::ProcessGroup;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::actor::Coordinator;
use crate::bootstrap::{check_requirements, resolve_args, run_commands, session_vars};
use crate::config::SyncConfig;
use crate::sync::{EventBus, SyncEvent, spawn_console};
use crate::utils::exec::Cmd;
use crate::{core::is_shutdown, log};

/// Time the console gets to print the last events.
const CONSOLE_FLUSH: Duration = Duration::from_millis(200);

/// One running session.
pub struct Session {
    config: Arc<SyncConfig>,
    bus: EventBus,
    vars: FxHashMap<String, String>,
    processes: ProcessGroup,
    /// Run `[bootstrap]` commands
    bootstrap: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn new(config: Arc<SyncConfig>) -> Self {
        let vars = session_vars(&config);
        Self {
            config,
            bus: EventBus::new(),
            vars,
            processes: ProcessGroup::new(),
            bootstrap: false,
            tasks: Vec::new(),
        }
    }

    /// Run `[bootstrap]` requirements, commands and after-seed commands.
    pub fn with_bootstrap(mut self, enable: bool) -> Self {
        self.bootstrap = enable;
        self
    }

    #[cfg(test)]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run until the shutdown signal. Startup failures are returned before
    /// any watcher starts.
    pub async fn run(mut self, shutdown_rx: Receiver<()>) -> Result<()> {
        if self.bootstrap {
            self.run_bootstrap().await?;
        }
        if self.config.serve.server_enable {
            self.start_server()?;
        }

        self.tasks.push(spawn_console(&self.bus));
        if let Some(task) = self.spawn_after_seed() {
            self.tasks.push(task);
        }

        let result = Coordinator::with_config(Arc::clone(&self.config))
            .with_event_bus(self.bus.clone())
            .with_shutdown_signal(shutdown_rx)
            .run()
            .await;

        self.close().await;
        result
    }

    /// Stop the dev server and the subscribers.
    async fn close(&mut self) {
        if !self.processes.is_empty() {
            crate::debug!("serve"; "stopping {} process(es)", self.processes.len());
            self.processes.kill_all();
        }
        tokio::time::sleep(CONSOLE_FLUSH).await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        log!("serve"; "session closed");
    }

    async fn run_bootstrap(&self) -> Result<()> {
        let bootstrap = &self.config.bootstrap;
        check_requirements(&bootstrap.require)?;
        if bootstrap.commands.is_empty() {
            return Ok(());
        }

        let commands = bootstrap.commands.clone();
        let vars = self.vars.clone();
        let cwd = self.config.root.clone();
        tokio::task::spawn_blocking(move || run_commands("bootstrap", &commands, &vars, &cwd))
            .await
            .context("bootstrap task panicked")?
    }

    fn start_server(&mut self) -> Result<()> {
        let serve = &self.config.serve;
        let runtime = &self.config.paths.runtime;
        let command = resolve_args(&serve.server, &self.vars);

        let cmd = Cmd::from_slice(&command).cwd(runtime).envs(&self.vars);
        self.processes
            .spawn("server", cmd)
            .with_context(|| format!("failed to start dev server in {}", runtime.display()))?;

        log!("serve"; "http://localhost:{}", serve.wp_port);
        Ok(())
    }

    /// Run `[bootstrap].after_seed` once the initial copy has settled.
    fn spawn_after_seed(&self) -> Option<JoinHandle<()>> {
        let commands = self.config.bootstrap.after_seed.clone();
        if !self.bootstrap || commands.is_empty() {
            return None;
        }

        let mut rx = self.bus.subscribe();
        let vars = self.vars.clone();
        let cwd = self.config.root.clone();

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SyncEvent::Seeded { .. }) => break,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return,
                }
            }
            if is_shutdown() {
                return;
            }

            let result = tokio::task::spawn_blocking(move || {
                run_commands("after-seed", &commands, &vars, &cwd)
            })
            .await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log!("error"; "{:#}", e),
                Err(e) => log!("error"; "after-seed task failed: {}", e),
            }
        }))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommandConfig, test_sync_config};

    #[tokio::test]
    async fn test_sync_session_deploys_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("hello.php"), "<?php").unwrap();
        let config = Arc::new(test_sync_config(&source, &dir.path().join("target")));
        let target = config.target_root();

        let session = Session::new(config);
        let mut events = session.bus().subscribe();
        let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();
        let handle = tokio::spawn(session.run(shutdown_rx));

        tokio::time::timeout(Duration::from_secs(5), async {
            while !matches!(events.recv().await, Ok(SyncEvent::Seeded { .. })) {}
        })
        .await
        .unwrap();
        assert!(target.join("hello.php").is_file());

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bootstrap_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello");
        std::fs::create_dir(&source).unwrap();
        let mut config = test_sync_config(&source, &dir.path().join("target"));
        config.bootstrap.commands = vec![CommandConfig {
            name: Some("download".into()),
            command: vec!["sh".into(), "-c".into(), "exit 4".into()],
            ..Default::default()
        }];

        let (_shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();
        let err = Session::new(Arc::new(config))
            .with_bootstrap(true)
            .run(shutdown_rx)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("`download`"));
        assert!(!dir.path().join("target").exists());
    }
}
