//! Utility modules shared across the sync engine.

pub mod exec;
pub mod path;
