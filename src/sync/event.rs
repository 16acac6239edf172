//! Engine events and the bus they are published on.
//!
//! The engine never prints. It publishes a `SyncEvent` for every action and
//! any number of subscribers (the console, tests) render or inspect them.

use crate::logger::{status_error, status_success, status_warning};
use crate::{debug, log};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Bus capacity. Slow subscribers skip ahead rather than block the engine.
const CAPACITY: usize = 1024;

/// One engine action. Paths are relative to the root they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Added {
        path: PathBuf,
    },
    Updated {
        path: PathBuf,
    },
    Removed {
        path: PathBuf,
    },
    BuildStarted {
        path: PathBuf,
        transform: String,
    },
    Built {
        path: PathBuf,
        transform: String,
        elapsed: Duration,
    },
    BuildFailed {
        path: PathBuf,
        transform: String,
        reason: String,
    },
    /// Stale artifacts deleted after their source went away.
    Pruned {
        source: PathBuf,
        artifacts: Vec<PathBuf>,
    },
    Error {
        path: PathBuf,
        message: String,
    },
    /// The initial scan has been mirrored.
    Seeded {
        files: usize,
    },
    /// Browsers were told to reload.
    Reloaded {
        path: PathBuf,
        clients: usize,
    },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { path } => write!(f, "added {}", path.display()),
            Self::Updated { path } => write!(f, "updated {}", path.display()),
            Self::Removed { path } => write!(f, "removed {}", path.display()),
            Self::BuildStarted { path, transform } => {
                write!(f, "building {} ({transform})", path.display())
            }
            Self::Built {
                path,
                transform,
                elapsed,
            } => write!(
                f,
                "built {} ({transform}, {}ms)",
                path.display(),
                elapsed.as_millis()
            ),
            Self::BuildFailed {
                path, transform, ..
            } => write!(f, "build failed {} ({transform})", path.display()),
            Self::Pruned { source, artifacts } => write!(
                f,
                "pruned {} artifact(s) of {}",
                artifacts.len(),
                source.display()
            ),
            Self::Error { path, message } => write!(f, "error {}: {message}", path.display()),
            Self::Seeded { files } => write!(f, "seeded {files} file(s)"),
            Self::Reloaded { path, clients } => {
                write!(f, "reload {} → {clients} client(s)", path.display())
            }
        }
    }
}

/// Broadcast channel for `SyncEvent`s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Publish to current subscribers. Having none is not an error.
    pub fn publish(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }
}

/// Render events on the terminal until the bus closes.
pub fn spawn_console(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => render(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log!("sync"; "console fell behind, {} event(s) not shown", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn render(event: &SyncEvent) {
    match event {
        SyncEvent::Added { .. } | SyncEvent::Updated { .. } | SyncEvent::Removed { .. } => {
            status_success(&event.to_string());
        }
        SyncEvent::Built { .. } | SyncEvent::Pruned { .. } => status_success(&event.to_string()),
        SyncEvent::BuildStarted { .. } => debug!("build"; "{}", event),
        SyncEvent::BuildFailed { reason, .. } => status_error(&event.to_string(), reason),
        SyncEvent::Error { .. } => status_warning(&event.to_string()),
        SyncEvent::Seeded { .. } => log!("sync"; "{}", event),
        SyncEvent::Reloaded { .. } => debug!("reload"; "{}", event),
    }
}
