//! Actor message types.
//!
//! ```text
//! FsActor(source) ──────┐
//!                       ├──SyncMsg──▶ SyncActor ──▶ SyncEngine
//! FsActor(build-output) ┘
//!
//! acceptor ──ReloadMsg──▶ ReloadActor ◀── notify (target root)
//!                              └──WebSocket──▶ browsers
//! ```

use std::net::TcpStream;

use crate::sync::{ArtifactEvent, ChangeEvent, RootRole};

/// Messages to SyncActor
#[derive(Debug)]
pub enum SyncMsg {
    /// A change under the primary source root
    Source(ChangeEvent),
    /// An artifact change under the build-output root
    Artifact(ArtifactEvent),
    /// Every initial event of this root has been sent
    ScanComplete(RootRole),
    /// Stop dispatching and abort queued handlers
    Shutdown,
}

impl From<ChangeEvent> for SyncMsg {
    /// Route by root: build-output changes become artifact events.
    fn from(event: ChangeEvent) -> Self {
        match ArtifactEvent::try_from(event) {
            Ok(artifact) => Self::Artifact(artifact),
            Err(source) => Self::Source(source),
        }
    }
}

/// Messages to ReloadActor
#[derive(Debug)]
pub enum ReloadMsg {
    /// New WebSocket connection (handshake pending)
    AddClient(TcpStream),
    Shutdown,
}
