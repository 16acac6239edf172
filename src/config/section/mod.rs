//! Configuration section definitions.
//!
//! Each module corresponds to a section in `wpsync.toml`:
//!
//! | Module      | TOML Section    | Purpose                                  |
//! |-------------|-----------------|------------------------------------------|
//! | `paths`     | `[paths]`       | Source, build-output, runtime, target    |
//! | `build`     | `[build]`       | Transform registry, artifact pruning     |
//! | `watch`     | `[watch]`       | Ignore filters, per-path debounce        |
//! | `serve`     | `[serve]`       | Dev server, live reload                  |
//! | `bootstrap` | `[bootstrap]`   | Required tools, one-shot setup commands  |

mod bootstrap;
pub mod build;
mod paths;
mod serve;
mod watch;

pub use bootstrap::{BootstrapConfig, CommandConfig};
pub use build::{BuildSectionConfig, ProjectConfigFile, Scaffold};
pub use paths::PathsConfig;
pub use serve::ServeConfig;
pub use watch::WatchConfig;
