//! Actor System for Live Sync
//!
//! Message-passing concurrency for a session:
//!
//! ```text
//! FsActor(source) ──────┐
//!                       ├──▶ SyncActor ──▶ SyncEngine ──▶ target root
//! FsActor(build-output) ┘                                      │
//!                                                ReloadActor ◀─┘ (notify)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - Per-root file watcher with debouncing and initial scan
//! - `sync` - Per-path dispatch into the sync engine
//! - `reload` - Target watcher and WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod reload;
pub mod sync;

pub use coordinator::Coordinator;
