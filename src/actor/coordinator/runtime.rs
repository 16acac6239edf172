use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actor::fs::FsActor;
use crate::actor::messages::{ReloadMsg, SyncMsg};
use crate::actor::reload::ReloadActor;
use crate::actor::sync::SyncActor;

/// How long an actor may take to stop before it is aborted.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// The reload notifier and its inbox.
pub(super) type Reload = (ReloadActor, mpsc::Sender<ReloadMsg>);

/// Run all actors until the shutdown signal (or until the sync actor stops).
pub(super) async fn run_actors(
    fs: Vec<FsActor>,
    sync: SyncActor,
    sync_tx: mpsc::Sender<SyncMsg>,
    reload: Option<Reload>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let mut sync_handle = tokio::spawn(sync.run());
    let fs_handles: Vec<_> = fs.into_iter().map(|actor| tokio::spawn(actor.run())).collect();
    let (reload_handle, reload_tx) = match reload {
        Some((actor, tx)) => (Some(tokio::spawn(actor.run())), Some(tx)),
        None => (None, None),
    };

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            if sync_handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        let _ = (&mut sync_handle).await;
    }

    // Watchers first, so nothing new reaches the lanes
    for handle in fs_handles {
        handle.abort();
    }

    crate::debug!("actor"; "sending shutdown to sync");
    let _ = sync_tx.send(SyncMsg::Shutdown).await;
    stop(sync_handle).await;

    if let (Some(handle), Some(tx)) = (reload_handle, reload_tx) {
        let _ = tx.send(ReloadMsg::Shutdown).await;
        stop(handle).await;
    }
}

async fn stop(mut handle: JoinHandle<()>) {
    if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
        handle.abort();
    }
}
