//! Sync Actor - dispatches changes to the engine.
//!
//! Each event runs as its own task in the lane of its path, so a slow build
//! only delays later events for the same file.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::mpsc;

use super::messages::SyncMsg;
use crate::sync::{EventBus, PathLanes, RootRole, SyncEngine, SyncEvent};

/// Tracks the handlers of the initial scan.
///
/// Held by the actor until the scan is complete and by every initial
/// handler; `Seeded` is published when the last holder lets go.
struct Seed {
    bus: EventBus,
    files: AtomicUsize,
    cancelled: AtomicBool,
}

impl Drop for Seed {
    fn drop(&mut self) {
        if !*self.cancelled.get_mut() {
            self.bus.publish(SyncEvent::Seeded {
                files: *self.files.get_mut(),
            });
        }
    }
}

/// Sync Actor - owns the per-path lanes
pub struct SyncActor {
    rx: mpsc::Receiver<SyncMsg>,
    engine: Arc<SyncEngine>,
    lanes: PathLanes,
    seed: Option<Arc<Seed>>,
    /// The seed after the actor released it, for cancellation
    pending_seed: Weak<Seed>,
}

impl SyncActor {
    pub fn new(rx: mpsc::Receiver<SyncMsg>, engine: Arc<SyncEngine>) -> Self {
        let seed = Arc::new(Seed {
            bus: engine.bus().clone(),
            files: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        });

        Self {
            rx,
            engine,
            lanes: PathLanes::new(),
            pending_seed: Arc::downgrade(&seed),
            seed: Some(seed),
        }
    }

    /// Run until `Shutdown` or until every sender is gone.
    ///
    /// Queued and running handlers are aborted on exit.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                SyncMsg::Source(event) => {
                    let seed = if event.initial { self.hold_seed() } else { None };
                    let engine = Arc::clone(&self.engine);
                    self.lanes.spawn(event.path.clone(), async move {
                        let outcome = engine.handle_source(event).await;
                        crate::debug!("sync"; "{:?}", outcome);
                        drop(seed);
                    });
                }
                SyncMsg::Artifact(event) => {
                    let engine = Arc::clone(&self.engine);
                    self.lanes.spawn(event.path.clone(), async move {
                        let outcome = engine.handle_artifact(event).await;
                        crate::debug!("sync"; "{:?}", outcome);
                    });
                }
                SyncMsg::ScanComplete(role) => {
                    crate::debug!("sync"; "{} scan complete", role);
                    self.engine.scan_complete(role);
                    if role == RootRole::Primary {
                        self.seed = None;
                    }
                }
                SyncMsg::Shutdown => {
                    crate::debug!("sync"; "shutting down");
                    break;
                }
            }
        }

        if let Some(seed) = self.pending_seed.upgrade() {
            seed.cancelled.store(true, Ordering::SeqCst);
        }
        self.lanes.abort_all();
    }

    fn hold_seed(&self) -> Option<Arc<Seed>> {
        self.seed.as_ref().map(|seed| {
            seed.files.fetch_add(1, Ordering::SeqCst);
            Arc::clone(seed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_sync_config;
    use crate::sync::{ChangeEvent, ChangeKind};
    use std::time::Duration;
    use tokio::sync::broadcast;

    async fn wait_seeded(events: &mut broadcast::Receiver<SyncEvent>) -> usize {
        let wait = async {
            loop {
                if let SyncEvent::Seeded { files } = events.recv().await.unwrap() {
                    return files;
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for Seeded")
    }

    fn setup() -> (tempfile::TempDir, Arc<SyncEngine>, std::path::PathBuf, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello");
        let target = dir.path().join("wp/hello");
        std::fs::create_dir_all(&source).unwrap();
        let config = test_sync_config(&source, &target);
        let engine = Arc::new(SyncEngine::from_config(&config, EventBus::new()));
        (dir, engine, config.paths.source.clone(), config.target_root())
    }

    #[tokio::test]
    async fn test_seeded_after_initial_files_deployed() {
        let (_dir, engine, source, target) = setup();
        std::fs::write(source.join("hello.php"), "<?php").unwrap();
        std::fs::write(source.join("readme.txt"), "hi").unwrap();
        let mut events = engine.bus().subscribe();

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(SyncActor::new(rx, engine).run());

        for name in ["hello.php", "readme.txt"] {
            let event = ChangeEvent::initial(source.join(name), RootRole::Primary);
            tx.send(SyncMsg::Source(event)).await.unwrap();
        }
        tx.send(SyncMsg::ScanComplete(RootRole::Primary)).await.unwrap();

        assert_eq!(wait_seeded(&mut events).await, 2);
        assert_eq!(std::fs::read(target.join("hello.php")).unwrap(), b"<?php");
        assert_eq!(std::fs::read(target.join("readme.txt")).unwrap(), b"hi");

        tx.send(SyncMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_scan_still_seeds() {
        let (_dir, engine, _source, _target) = setup();
        let mut events = engine.bus().subscribe();

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(SyncActor::new(rx, engine).run());
        tx.send(SyncMsg::ScanComplete(RootRole::Primary)).await.unwrap();

        assert_eq!(wait_seeded(&mut events).await, 0);
        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_live_events_after_seed() {
        let (_dir, engine, source, target) = setup();
        let mut events = engine.bus().subscribe();

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(SyncActor::new(rx, engine).run());
        tx.send(SyncMsg::ScanComplete(RootRole::Primary)).await.unwrap();
        wait_seeded(&mut events).await;

        let path = source.join("live.php");
        std::fs::write(&path, "<?php // live").unwrap();
        tx.send(ChangeEvent::new(ChangeKind::Created, &path, RootRole::Primary).into())
            .await
            .unwrap();

        let added = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(added, SyncEvent::Added { path: "live.php".into() });
        assert!(target.join("live.php").is_file());

        tx.send(SyncMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
