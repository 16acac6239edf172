//! Command-line interface module.

mod args;
pub mod start;

pub use args::{Cli, Commands};
