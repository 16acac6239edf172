//! FileSystem Actor
//!
//! One actor per watch root. Sends classified changes to the SyncActor.
//! Implements the "Watcher-First" pattern: the watcher is attached before the
//! initial scan, so nothing written during the scan is lost.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (per-path timing) → Classifier (filesystem checks) → SyncMsg
//! ```
//!
//! The source root is scanned once at startup and every file found is sent as
//! an initial event. The build-output root is not scanned: artifacts left from
//! an earlier session are only deployed once their source is rebuilt.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::SyncMsg;
use crate::sync::{ChangeEvent, ChangeKind, RootRole, WatchRoot};

// Raw changes -> ChangeEvents.
mod classifier;
// Per-path timing and deduplication.
mod debouncer;
// Hidden/ignored/excluded paths.
mod filter;
// Recursive file listing.
mod scan;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


pub(crate) use debouncer::Debouncer;
pub use filter::EventFilter;

use classifier::EventClassifier;
use scan::scan_files;
use watch_roots::RootWatch;

/// How often a missing root is looked for.
const REATTACH_INTERVAL: Duration = Duration::from_millis(500);

/// A notify watcher whose events arrive on a tokio channel.
///
/// notify calls back on its own thread; a forwarding thread moves events
/// across and ends when the receiver is dropped.
pub(crate) fn bridged_watcher(
    module: &'static str,
) -> notify::Result<(RecommendedWatcher, mpsc::Receiver<notify::Event>)> {
    let (raw_tx, raw_rx) = std::sync::mpsc::channel();
    let watcher = notify::recommended_watcher(move |res| {
        raw_tx.send(res).ok();
    })?;

    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        for result in raw_rx {
            match result {
                Ok(event) => {
                    if tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => crate::log!(module; "watcher error: {}", e),
            }
        }
    });
    Ok((watcher, rx))
}

/// The SyncActor is gone.
struct Disconnected;

/// FileSystem Actor - watches one root
pub struct FsActor {
    root: WatchRoot,
    events: mpsc::Receiver<notify::Event>,
    /// Dropping it stops the events
    watcher: RecommendedWatcher,
    root_watch: RootWatch,
    sync_tx: mpsc::Sender<SyncMsg>,
    debouncer: Debouncer,
    filter: Arc<EventFilter>,
}

impl FsActor {
    /// The watcher starts immediately and buffers events until `run` is
    /// polled. A missing root is attached once it appears.
    pub fn new(
        root: WatchRoot,
        filter: EventFilter,
        debounce: Option<Duration>,
        sync_tx: mpsc::Sender<SyncMsg>,
    ) -> notify::Result<Self> {
        let (mut watcher, events) = bridged_watcher("watch")?;
        let root_watch = RootWatch::attach(&root.path, &mut watcher)?;

        Ok(Self {
            root,
            events,
            watcher,
            root_watch,
            sync_tx,
            debouncer: Debouncer::new(debounce),
            filter: Arc::new(filter),
        })
    }

    /// Run the actor event loop until the SyncActor goes away.
    pub async fn run(self) {
        let Self {
            root,
            mut events,
            mut watcher,
            mut root_watch,
            sync_tx,
            mut debouncer,
            filter,
        } = self;

        let role = root.role;
        if initial_scan(&root, &filter, &sync_tx).await.is_err() {
            return;
        }

        loop {
            let sleep = if root_watch.is_attached() {
                debouncer.sleep_duration()
            } else {
                debouncer.sleep_duration().min(REATTACH_INTERVAL)
            };

            tokio::select! {
                biased;
                Some(event) = events.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(sleep) => {
                    if let Some(path) = root_watch.reattach(&mut watcher)
                        && recover_root(path, role, &filter, &sync_tx).await.is_err()
                    {
                        return;
                    }
                    if process_changes(&mut debouncer, &filter, role, &sync_tx).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Seed the source root, then mark the root's scan complete.
async fn initial_scan(
    root: &WatchRoot,
    filter: &Arc<EventFilter>,
    sync_tx: &mpsc::Sender<SyncMsg>,
) -> Result<(), Disconnected> {
    if root.role == RootRole::Primary {
        let files = list_files(&root.path, filter).await;
        crate::debug!("watch"; "initial scan of {}: {} file(s)", root.path.display(), files.len());

        for path in files {
            send(sync_tx, ChangeEvent::initial(path, root.role).into()).await?;
        }
    }
    send(sync_tx, SyncMsg::ScanComplete(root.role)).await
}

/// A root came back: whatever it holds now is new.
async fn recover_root(
    path: &Path,
    role: RootRole,
    filter: &Arc<EventFilter>,
    sync_tx: &mpsc::Sender<SyncMsg>,
) -> Result<(), Disconnected> {
    for file in list_files(path, filter).await {
        send(sync_tx, ChangeEvent::new(ChangeKind::Created, file, role).into()).await?;
    }
    Ok(())
}

async fn list_files(dir: &Path, filter: &Arc<EventFilter>) -> Vec<PathBuf> {
    let dir = dir.to_path_buf();
    let filter = Arc::clone(filter);
    tokio::task::spawn_blocking(move || scan_files(&dir, &filter))
        .await
        .unwrap_or_else(|e| {
            crate::log!("watch"; "scan failed: {}", e);
            Vec::new()
        })
}

/// Process debounced file changes
async fn process_changes(
    debouncer: &mut Debouncer,
    filter: &Arc<EventFilter>,
    role: RootRole,
    sync_tx: &mpsc::Sender<SyncMsg>,
) -> Result<(), Disconnected> {
    let Some(raw) = debouncer.take_ready() else {
        return Ok(());
    };

    for event in EventClassifier::classify(raw, filter, role) {
        crate::debug!("watch"; "{} {}: {}", role, event.kind.label(), event.path.display());
        send(sync_tx, event.into()).await?;
    }
    Ok(())
}

async fn send(sync_tx: &mpsc::Sender<SyncMsg>, msg: SyncMsg) -> Result<(), Disconnected> {
    sync_tx.send(msg).await.map_err(|_| Disconnected)
}
