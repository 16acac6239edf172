//! Bootstrap command execution.

use crate::config::{CommandConfig, SyncConfig};
use crate::log;
use crate::utils::exec::{Cmd, OutputFilter};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::path::Path;

// ============================================================================
// Environment Variables
// ============================================================================

/// Build the session-wide `$WPSYNC_*` variables.
pub fn session_vars(config: &SyncConfig) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    let paths = &config.paths;

    vars.insert("WPSYNC_SOURCE".into(), paths.source.display().to_string());
    vars.insert(
        "WPSYNC_BUILD_OUTPUT".into(),
        paths.build_output.display().to_string(),
    );
    vars.insert(
        "WPSYNC_TARGET".into(),
        config.target_root().display().to_string(),
    );
    vars.insert("WPSYNC_RUNTIME".into(), paths.runtime.display().to_string());
    vars.insert("WPSYNC_PLUGIN".into(), config.plugin_name());
    vars.insert("WPSYNC_PORT".into(), config.serve.port.to_string());
    vars.insert("WPSYNC_WP_PORT".into(), config.serve.wp_port.to_string());

    vars
}

// ============================================================================
// Command Argument Resolution
// ============================================================================

/// Resolve `$WPSYNC_*` variables in command arguments.
///
/// Longer names are substituted first so no name can shadow another that
/// shares its prefix.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<_> = vars.keys().collect();
    keys.sort_by_key(|key| std::cmp::Reverse(key.len()));

    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for key in &keys {
                let pattern = format!("${key}");
                if result.contains(&pattern) {
                    result = result.replace(&pattern, &vars[*key]);
                }
            }
            result
        })
        .collect()
}

// ============================================================================
// Execution
// ============================================================================

/// Fail unless every required tool is on `PATH`.
pub fn check_requirements(require: &[String]) -> Result<()> {
    let missing: Vec<&str> = require
        .iter()
        .map(String::as_str)
        .filter(|tool| which::which(tool).is_err())
        .collect();

    if !missing.is_empty() {
        bail!("required tools not found on PATH: {}", missing.join(", "));
    }
    Ok(())
}

/// Run a list of commands in order, stopping at the first failure.
///
/// The `phase` parameter is used for logging (e.g., "bootstrap").
pub fn run_commands(
    phase: &str,
    commands: &[CommandConfig],
    vars: &FxHashMap<String, String>,
    cwd: &Path,
) -> Result<()> {
    for command in commands.iter().filter(|c| c.enable && !c.command.is_empty()) {
        run_command(phase, command, vars, cwd)
            .with_context(|| format!("{phase} step `{}` failed", command.display_name()))?;
    }
    Ok(())
}

fn run_command(
    phase: &str,
    command: &CommandConfig,
    vars: &FxHashMap<String, String>,
    cwd: &Path,
) -> Result<()> {
    let resolved = resolve_args(&command.command, vars);
    let filter = if command.quiet {
        OutputFilter::QUIET
    } else {
        OutputFilter::VERBOSE
    };

    log!(phase; "`{}` running", command.display_name());

    let output = Cmd::from_slice(&resolved)
        .cwd(cwd)
        .envs(vars)
        .filter(filter)
        .run()?;

    if !command.quiet {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
    }

    Ok(())
}
