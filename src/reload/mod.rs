//! Reload Module
//!
//! Tells browsers to reload when the deployed plugin changes.
//!
//! ```text
//! target root --notify--> ReloadActor --WebSocket--> Browser
//!                                                      ^
//!                              mu-plugin client -------+
//! ```
//!
//! There is no coupling with the sync engine: the notifier only sees files
//! landing in the target root.
//!
//! # Modules
//!
//! - `client` - Browser client, installed as a WordPress mu-plugin
//! - `message` - JSON messages sent to clients
//! - `server` - WebSocket acceptor

pub mod client;
pub mod message;
pub mod server;
