//! One-shot runtime provisioning.
//!
//! wpsync never installs WordPress itself; the commands in `[bootstrap]` do.
//! This module checks the tools they need and runs them with `$WPSYNC_*`
//! variables available.

mod runner;

pub use runner::{check_requirements, resolve_args, run_commands, session_vars};
