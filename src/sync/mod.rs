//! Live synchronization of a plugin source tree into a WordPress runtime.
//!
//! # Pipeline
//!
//! ```text
//! source root ──▶ SyncEngine ──┬─▶ copy ───────────────────────────▶ target root
//!                              └─▶ BuildRunner ─▶ build-output root
//!                                                      │
//!                      ArtifactEvent ◀─────────────────┘
//!                            │
//!                            └─▶ SyncEngine ─▶ copy ─────────────────▶ target root
//! ```
//!
//! | Module      | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `types`     | Watch roots, change and artifact events          |
//! | `mapper`    | Root-relative path mapping into the target       |
//! | `transform` | Extension → build directive registry             |
//! | `build`     | External compiler invocation                     |
//! | `deploy`    | Atomic copy and recursive removal                |
//! | `lanes`     | Per-path ordering of concurrent handlers         |
//! | `event`     | `SyncEvent` bus and console rendering            |
//! | `engine`    | Per-event state machine                          |

pub mod build;
pub mod deploy;
pub mod engine;
pub mod error;
pub mod event;
pub mod lanes;
pub mod mapper;
pub mod transform;
pub mod types;


pub use engine::SyncEngine;
pub use event::{EventBus, SyncEvent, spawn_console};
pub use lanes::PathLanes;
pub use types::{ArtifactEvent, ChangeEvent, ChangeKind, RootRole, WatchRoot};
