//! Process-wide shutdown state.
//!
//! `SHUTDOWN` is set once Ctrl+C is received. Before a session registers its
//! shutdown channel the process just exits; afterwards the session is asked to
//! tear down (kill the dev server and compilers, stop the watchers).

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for the running session
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Before `register_session()`: exit immediately, nothing to clean up
/// - After `register_session()`: notify the session, exit on a second Ctrl+C
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        let repeated = SHUTDOWN.swap(true, Ordering::SeqCst);

        match SHUTDOWN_TX.get() {
            Some(tx) if !repeated => {
                crate::log!("serve"; "shutting down...");
                let _ = tx.send(());
            }
            _ => std::process::exit(130),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the running session for graceful shutdown
pub fn register_session(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Request shutdown without a signal (e.g. the dev server died)
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
    if let Some(tx) = SHUTDOWN_TX.get() {
        let _ = tx.send(());
    }
}
