//! External processes: bootstrap steps, compilers and the dev server.
//!
//! ```ignore
//! // Blocking, for bootstrap steps
//! Cmd::from_slice(&["wp", "core", "download"]).cwd(runtime).run()?;
//!
//! // On the runtime; dropping the future kills the compiler
//! Cmd::from_slice(&["npx", "tsc", "src/app.ts"]).cwd(plugin).run_async().await?;
//!
//! // Long-running, owned by the caller
//! let child = Cmd::from_slice(&["php", "-S", "localhost:8080"]).spawn()?;
//! ```
//!
//! A nonzero exit is an error whose message carries the program's output,
//! stdout included: compilers such as `tsc` print diagnostics there.

use crate::log;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::LazyLock;

/// A program, its arguments and where to run it.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    filter: OutputFilter,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// `["npx", "tsc", ...]`: the first element is the program. Empty
    /// arguments are kept, positional scripts rely on them.
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let Some((program, args)) = cmd.split_first() else {
            return Self::default();
        };
        Self {
            args: args.iter().map(|s| s.as_ref().to_owned()).collect(),
            ..Self::new(program)
        }
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Extra environment variables, on top of the inherited ones.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.envs.extend(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned())),
        );
        self
    }

    pub fn filter(mut self, filter: OutputFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Run to completion, blocking the current thread.
    pub fn run(self) -> Result<Output> {
        let name = self.program_name();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("failed to execute `{name}`"))?;
        self.filter.check(&name, output)
    }

    /// Run to completion on the tokio runtime.
    ///
    /// The child is killed if the future is dropped first.
    pub async fn run_async(self) -> Result<Output> {
        let name = self.program_name();
        let output = self
            .tokio_command()
            .output()
            .await
            .with_context(|| format!("failed to execute `{name}`"))?;
        self.filter.check(&name, output)
    }

    /// Start with inherited stdout/stderr. Dropping the child kills it.
    pub fn spawn(self) -> Result<tokio::process::Child> {
        let name = self.program_name();
        self.tokio_command()
            .spawn()
            .with_context(|| format!("failed to spawn `{name}`"))
    }

    fn tokio_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

// ============================================================================
// Output
// ============================================================================

/// What to show of a command's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFilter {
    /// Do not log stderr of successful runs.
    quiet: bool,
    /// Line prefixes that are never shown, not even on failure.
    noise: &'static [&'static str],
}

impl OutputFilter {
    /// Log everything.
    pub const VERBOSE: Self = Self {
        quiet: false,
        noise: &[],
    };

    /// Only show output when the command fails.
    pub const QUIET: Self = Self {
        quiet: true,
        noise: &[],
    };

    /// Drop npm/npx chatter, keep compiler diagnostics.
    pub const NPM: Self = Self {
        quiet: false,
        noise: &["npm warn", "npm WARN", "npm notice"],
    };

    /// Non-empty, ANSI-free lines that are not noise.
    fn lines(self, text: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(text)
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !line.is_empty() && !self.noise.iter().any(|p| line.starts_with(p)))
            .collect()
    }

    /// Turn a nonzero exit into an error, log stderr otherwise.
    fn check(self, name: &str, output: Output) -> Result<Output> {
        if !output.status.success() {
            let mut message = format!("`{name}` failed with {}", output.status);
            for line in self.lines(&output.stderr).into_iter().chain(self.lines(&output.stdout)) {
                message.push('\n');
                message.push_str(&line);
            }
            bail!(message);
        }

        if !self.quiet {
            let stderr = self.lines(&output.stderr);
            if !stderr.is_empty() {
                log!(name; "{}", stderr.join("\n"));
            }
        }
        Ok(output)
    }
}

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static ANSI: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI regex"));
    ANSI.replace_all(s, "")
}
