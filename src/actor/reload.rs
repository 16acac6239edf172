//! Reload Actor - watches the deployed plugin and notifies browsers.
//!
//! # Architecture
//!
//! ```text
//! target root --notify--> Debouncer --reload globs--> broadcast --> Clients
//! acceptor thread --AddClient--------------------------^
//! ```
//!
//! Deploys are atomic renames, so a reload never sees a half-written file.

use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use globset::GlobSet;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::fs::{Debouncer, bridged_watcher};
use super::messages::ReloadMsg;
use crate::reload::message::ReloadMessage;
use crate::sync::{EventBus, SyncEvent};
use crate::utils::path::strip_root;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Reload Actor - owns the target watcher and the WebSocket clients
pub struct ReloadActor {
    rx: mpsc::Receiver<ReloadMsg>,
    target: PathBuf,
    globs: GlobSet,
    /// Target watcher events, bridged from notify's thread
    events: mpsc::Receiver<notify::Event>,
    _watcher: RecommendedWatcher,
    debouncer: Debouncer,
    clients: Clients,
    bus: EventBus,
}

impl ReloadActor {
    /// Watch `target` right away; changes before `run` are buffered.
    ///
    /// The target root is created if it does not exist yet.
    pub fn new(
        rx: mpsc::Receiver<ReloadMsg>,
        target: PathBuf,
        globs: GlobSet,
        debounce: Option<Duration>,
        bus: EventBus,
    ) -> notify::Result<Self> {
        std::fs::create_dir_all(&target)?;

        let (mut watcher, events) = bridged_watcher("reload")?;
        watcher.watch(&target, RecursiveMode::Recursive)?;

        Ok(Self {
            rx,
            target,
            globs,
            events,
            _watcher: watcher,
            debouncer: Debouncer::new(debounce),
            clients: Arc::new(Mutex::new(Vec::new())),
            bus,
        })
    }

    /// Run until `Shutdown` or until every sender is gone.
    pub async fn run(mut self) {
        let clients = Arc::downgrade(&self.clients);
        std::thread::spawn(move || client_reader_loop(clients));

        loop {
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(ReloadMsg::AddClient(stream)) => self.add_client(stream),
                    Some(ReloadMsg::Shutdown) | None => break,
                },
                Some(event) = self.events.recv() => self.debouncer.add_event(&event),
                _ = tokio::time::sleep(self.debouncer.sleep_duration()) => {
                    if let Some(changes) = self.debouncer.take_ready() {
                        let mut paths: Vec<PathBuf> = changes.into_keys().collect();
                        paths.sort();
                        self.reload(&paths);
                    }
                }
            }
        }

        crate::debug!("reload"; "shutting down");
        for mut client in self.clients.lock().drain(..) {
            let _ = client.close(None);
        }
    }

    /// Broadcast a reload if any path matches the reload globs.
    fn reload(&self, paths: &[PathBuf]) {
        let matched: Vec<PathBuf> = paths
            .iter()
            .map(|path| strip_root(path, &self.target))
            .filter(|rel| self.is_reload_trigger(rel))
            .collect();

        let Some(first) = matched.first() else {
            return;
        };

        let reason = match matched.len() {
            1 => format!("{} changed", first.display()),
            n => format!("{n} files changed"),
        };
        let clients = self.broadcast(&ReloadMessage::reload(reason));

        self.bus.publish(SyncEvent::Reloaded {
            path: first.clone(),
            clients,
        });
    }

    fn is_reload_trigger(&self, rel: &Path) -> bool {
        !rel.as_os_str().is_empty() && self.globs.is_match(rel)
    }

    /// Send to every client, dropping the ones that went away.
    fn broadcast(&self, msg: &ReloadMessage) -> usize {
        let text = Message::Text(msg.to_json().into());
        let mut clients = self.clients.lock();

        clients.retain_mut(|ws| match ws.send(text.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        clients.len()
    }

    fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let _ = ws.get_ref().set_nonblocking(true);

                let connected = Message::Text(ReloadMessage::connected().to_json().into());
                if let Err(e) = ws.send(connected) {
                    crate::log!("reload"; "failed to send connected message: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                clients.push(ws);
                crate::debug!("reload"; "client connected (total: {})", clients.len());
            }
            Err(e) => crate::log!("reload"; "handshake failed: {}", e),
        }
    }
}

/// Poll clients for close frames; exits with the actor.
fn client_reader_loop(clients: Weak<Mutex<Vec<WebSocket<TcpStream>>>>) {
    loop {
        std::thread::sleep(Duration::from_millis(100));
        let Some(clients) = clients.upgrade() else {
            return;
        };

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServeConfig;
    use crate::utils::path::normalize_path;

    fn actor(target: &Path) -> (mpsc::Sender<ReloadMsg>, ReloadActor) {
        let (tx, rx) = mpsc::channel(8);
        let actor = ReloadActor::new(
            rx,
            target.to_path_buf(),
            ServeConfig::default().reload_set(),
            Some(Duration::from_millis(20)),
            EventBus::new(),
        )
        .unwrap();
        (tx, actor)
    }

    #[test]
    fn test_reload_globs() {
        let dir = tempfile::tempdir().unwrap();
        let (_tx, actor) = actor(dir.path());

        assert!(actor.is_reload_trigger(Path::new("hello.php")));
        assert!(actor.is_reload_trigger(Path::new("assets/app.js")));
        assert!(actor.is_reload_trigger(Path::new("assets/site.css")));
        assert!(!actor.is_reload_trigger(Path::new("readme.txt")));
        assert!(!actor.is_reload_trigger(Path::new("")));
    }

    #[tokio::test]
    async fn test_deployed_php_triggers_reload() {
        let dir = tempfile::tempdir().unwrap();
        let target = normalize_path(dir.path());
        let (tx, actor) = actor(&target);
        let mut events = actor.bus.subscribe();
        let handle = tokio::spawn(actor.run());

        std::fs::write(target.join("readme.txt"), "ignored").unwrap();
        std::fs::write(target.join("hello.php"), "<?php").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for reload")
            .unwrap();
        assert_eq!(
            event,
            SyncEvent::Reloaded {
                path: "hello.php".into(),
                clients: 0,
            }
        );

        tx.send(ReloadMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
