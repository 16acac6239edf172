//! Process-wide state shared across the session.

mod state;

pub use state::{is_shutdown, register_session, request_shutdown, setup_shutdown_handler};
