//! Terminal display surface.
//!
//! The indicator label and icon are buffered; every detail rebuild prints
//! one block: a status line followed by the detail entries.

use std::io::{self, Write};

use proxmon_core::display::{DetailEntry, DisplaySink, FAILURE_ICON};
use proxmon_core::monitoring::{Placement, Severity};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// [`DisplaySink`] that prints to a writer
pub struct TerminalSink<W: Write + Send = io::Stdout> {
    out: W,
    color: bool,
    timestamps: bool,
    label: String,
    icon: String,
}

impl TerminalSink<io::Stdout> {
    /// Creates a sink writing to stdout
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    /// Creates a sink writing to `out`
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            timestamps: false,
            label: String::new(),
            icon: String::new(),
        }
    }

    /// Prefixes every status line with the local time
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn icon_color(&self) -> &'static str {
        if self.icon == Severity::Normal.icon_name() {
            GREEN
        } else if self.icon == Severity::Warning.icon_name() {
            YELLOW
        } else if self.icon == FAILURE_ICON {
            RED
        } else {
            DIM
        }
    }

    fn status_line(&self) -> String {
        let mut line = String::new();
        if self.timestamps {
            line.push_str(&self.paint(
                DIM,
                &format!("[{}] ", chrono::Local::now().format("%H:%M:%S")),
            ));
        }
        line.push_str(&self.paint(self.icon_color(), "●"));
        line.push(' ');
        line.push_str(&self.paint(BOLD, &self.label));
        line
    }

    fn entry_line(&self, entry: &DetailEntry) -> String {
        match entry {
            DetailEntry::Header(text) => format!("  {}", self.paint(BOLD, text)),
            DetailEntry::Item(text) => format!("  {text}"),
            DetailEntry::Separator => format!("  {}", self.paint(DIM, &entry.to_string())),
        }
    }

    fn emit(&mut self, lines: &[String]) {
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(self.out, "{line}"))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }

    /// Consumes the sink and returns the writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> DisplaySink for TerminalSink<W> {
    fn set_label(&mut self, text: &str) {
        text.clone_into(&mut self.label);
    }

    fn set_icon(&mut self, icon_name: &str) {
        icon_name.clone_into(&mut self.icon);
    }

    fn replace_entries(&mut self, entries: Vec<DetailEntry>) {
        let mut lines = vec![self.status_line()];
        lines.extend(entries.iter().map(|entry| self.entry_line(entry)));
        self.emit(&lines);
    }

    fn reposition(&mut self, placement: Placement) {
        tracing::debug!(%placement, "Indicator placement changed");
        let line = self.paint(DIM, &format!("(indicator placement: {placement})"));
        self.emit(&[line]);
    }
}
