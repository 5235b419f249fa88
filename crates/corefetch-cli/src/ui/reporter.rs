//! Console implementation of the core `Reporter`.
//!
//! Writes to stderr so stdout stays clean for `plan --json`. Download
//! progress is redrawn in place on a terminal and suppressed otherwise.

use std::io::{IsTerminal, Stderr, Write};
use std::sync::{Mutex, PoisonError};

use corefetch_core::Reporter;
use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};

use super::progress::{format_download_progress, percent};
use super::theme::{Theme, format_size};

/// Last progress line drawn, to skip redundant redraws.
#[derive(Debug, Default)]
struct LiveLine {
    name: String,
    percent: Option<u64>,
    bytes: u64,
}

#[derive(Debug)]
pub struct ConsoleReporter {
    theme: Theme,
    interactive: bool,
    live: Mutex<Option<LiveLine>>,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            theme: Theme::default(),
            interactive: std::io::stderr().is_terminal(),
            live: Mutex::new(None),
        }
    }

    fn label(&self, name: &str, version: &str) -> String {
        let width = self.theme.name_width;
        format!(
            "{}  {}",
            format!("{name:<width$}").with(self.theme.colors.name),
            format!("{version:<10}").with(self.theme.colors.secondary)
        )
    }

    /// Drop the in-place progress line, if any, before printing a full line.
    fn clear_live(&self, out: &mut Stderr) {
        let had_live = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if had_live && self.interactive {
            let _ = out.queue(MoveToColumn(0));
            let _ = out.queue(Clear(ClearType::CurrentLine));
        }
    }

    fn line(&self, text: &str) {
        let mut out = std::io::stderr();
        self.clear_live(&mut out);
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        self.line("");
        self.line(&format!("{}", title.bold()));
    }

    fn downloading(&self, name: &str, version: &str, current: u64, total: Option<u64>) {
        if !self.interactive {
            return;
        }

        let pct = percent(current, total);
        {
            let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(line) = live.as_ref() {
                let unchanged = line.name == name
                    && match pct {
                        Some(_) => line.percent == pct,
                        // Unknown length: redraw roughly every 256 KiB.
                        None => current.saturating_sub(line.bytes) < 256 * 1024,
                    };
                if unchanged && current > 0 {
                    return;
                }
            }
            *live = Some(LiveLine {
                name: name.to_string(),
                percent: pct,
                bytes: current,
            });
        }

        let mut out = std::io::stderr();
        let _ = out.queue(MoveToColumn(0));
        let _ = out.queue(Clear(ClearType::CurrentLine));
        let _ = write!(
            out,
            "  {} {}  {}",
            self.theme.icons.active.with(self.theme.colors.warning),
            self.label(name, version),
            format_download_progress(current, total)
        );
        let _ = out.flush();
    }

    fn extracting(&self, name: &str, version: &str) {
        if !self.interactive {
            return;
        }
        let mut out = std::io::stderr();
        let _ = out.queue(MoveToColumn(0));
        let _ = out.queue(Clear(ClearType::CurrentLine));
        let _ = write!(
            out,
            "  {} {}  {}",
            self.theme.icons.active.with(self.theme.colors.warning),
            self.label(name, version),
            "unpacking".with(self.theme.colors.secondary)
        );
        let _ = out.flush();
        *self.live.lock().unwrap_or_else(PoisonError::into_inner) = Some(LiveLine::default());
    }

    fn done(&self, name: &str, version: &str, detail: &str, size: Option<u64>) {
        let size = size.map(format_size).unwrap_or_default();
        self.line(&format!(
            "  {} {}  {:>9}  {}",
            self.theme.icons.success.with(self.theme.colors.success),
            self.label(name, version),
            size,
            detail.with(self.theme.colors.secondary)
        ));
    }

    fn failed(&self, name: &str, version: &str, reason: &str) {
        self.line(&format!(
            "  {} {}  {}",
            self.theme.icons.error.with(self.theme.colors.error),
            self.label(name, version),
            reason.with(self.theme.colors.error)
        ));
    }

    fn info(&self, msg: &str) {
        self.line(&format!(
            "  {} {msg}",
            self.theme.icons.info.with(self.theme.colors.secondary)
        ));
    }

    fn warning(&self, msg: &str) {
        self.line(&format!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        ));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        let noun = if count == 1 { "artifact" } else { "artifacts" };
        self.line("");
        self.line(&format!(
            "  {count} {noun} {action} {}",
            format!("in {elapsed_secs:.1}s").with(self.theme.colors.secondary)
        ));
    }
}
