//! Terminal output.
//!
//! Two kinds of lines reach the terminal:
//!
//! - module lines, `[sync] seeded 12 file(s)`, printed by `log!` and by
//!   `debug!` when `--verbose` is on
//! - status lines, `[12:04:31] ✓ updated includes/admin.php`, one per engine
//!   event, printed through `status_success`/`status_error`/`status_warning`
//!
//! A failed build prints a multi-line status block. The next status line
//! replaces it as long as nothing else was printed in between, so a fixed
//! build does not leave the old failure on screen.
//!
//! ```ignore
//! log!("reload"; "ws://localhost:{}", port);
//! debug!("watch"; "{} raw event(s)", events.len());
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::io::{StdoutLock, Write, stdout};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Lines written so far. A status block compares it to tell whether it is
/// still the last thing on screen.
static LINES_WRITTEN: AtomicUsize = AtomicUsize::new(0);

static STATUS: Mutex<StatusBlock> = parking_lot::const_mutex(StatusBlock::new());

/// Enable `debug!` output (`--verbose`).
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Print a module line.
///
/// ```ignore
/// log!("sync"; "{} → {}", source.display(), target.display());
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Print a module line only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let prefix = module_prefix(module);
    write_lines(1, |out| {
        execute!(out, Clear(ClearType::UntilNewLine)).ok();
        writeln!(out, "{prefix} {message}")
    });
}

/// `[module]`, colored by the part of the session it comes from.
fn module_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "sync" | "watch" => prefix.bright_green().bold().to_string(),
        "serve" | "reload" => prefix.bright_blue().bold().to_string(),
        "build" | "bootstrap" | "after-seed" => prefix.bright_magenta().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

fn write_lines<F>(count: usize, write: F)
where
    F: FnOnce(&mut StdoutLock<'_>) -> std::io::Result<()>,
{
    let mut out = stdout().lock();
    LINES_WRITTEN.fetch_add(count, Ordering::SeqCst);
    write(&mut out).ok();
    out.flush().ok();
}

// ============================================================================
// Status lines
// ============================================================================

/// Wall-clock `HH:MM:SS` (UTC).
fn clock() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}

/// The last error block, while it can still be replaced.
struct StatusBlock {
    lines: usize,
    /// `LINES_WRITTEN` right after the block was printed
    written_at: usize,
}

impl StatusBlock {
    const fn new() -> Self {
        Self {
            lines: 0,
            written_at: 0,
        }
    }

    fn print(&mut self, symbol: String, message: &str) {
        let lines = message.lines().count().max(1);
        let stamp = format!("[{}]", clock()).dimmed().to_string();
        write_lines(lines, |out| writeln!(out, "{stamp} {symbol} {message}"));
    }

    /// Erase the error block if nothing was printed after it.
    fn retract(&mut self) {
        let lines = std::mem::take(&mut self.lines);
        if lines == 0 || self.written_at != LINES_WRITTEN.load(Ordering::SeqCst) {
            return;
        }
        let up = u16::try_from(lines).unwrap_or(u16::MAX);
        let mut out = stdout().lock();
        execute!(out, cursor::MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
        out.flush().ok();
        LINES_WRITTEN.fetch_sub(lines, Ordering::SeqCst);
    }
}

/// `✓ message`. Replaces a preceding error block.
pub fn status_success(message: &str) {
    let mut status = STATUS.lock();
    status.retract();
    status.print("✓".green().to_string(), message);
}

/// `✗ summary` followed by `detail` (e.g. compiler output).
pub fn status_error(summary: &str, detail: &str) {
    let message = match detail.trim() {
        "" => summary.to_string(),
        detail => format!("{summary}\n{detail}"),
    };

    let mut status = STATUS.lock();
    status.retract();
    status.print("✗".red().to_string(), &message);
    status.lines = message.lines().count().max(1);
    status.written_at = LINES_WRITTEN.load(Ordering::SeqCst);
}

/// `⚠ message`. Never replaced.
pub fn status_warning(message: &str) {
    STATUS.lock().print("⚠".yellow().to_string(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_format() {
        let stamp = clock();
        assert_eq!(stamp.len(), 8);
        assert_eq!(stamp.matches(':').count(), 2);
    }

    #[test]
    fn test_prefix_contains_module() {
        assert!(module_prefix("sync").contains("[sync]"));
        assert!(module_prefix("Build").contains("[Build]"));
    }

    #[test]
    fn test_block_not_retracted_after_other_output() {
        let mut block = StatusBlock::new();
        block.lines = 3;
        block.written_at = LINES_WRITTEN.load(Ordering::SeqCst);
        LINES_WRITTEN.fetch_add(1, Ordering::SeqCst);

        block.retract();
        assert_eq!(block.lines, 0);
    }
}
