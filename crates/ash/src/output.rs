//! Terminal output for the shell.
//!
//! `Console` writes everything the user is meant to read: command results,
//! tables, errors, and streamed job output. Logs never go through here.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{AnsiColors, OwoColorize};
use tabled::{Table, Tabled, settings::Style};

pub struct Console {
    out: Box<dyn Write>,
    color: bool,
    interactive: bool,
}

impl Console {
    /// Console on stdout. Colour and spinners only when attached to a
    /// terminal; `NO_COLOR` turns colour off.
    pub fn stdout() -> Self {
        let tty = io::stdout().is_terminal();
        Self {
            out: Box::new(io::stdout()),
            color: tty && std::env::var_os("NO_COLOR").is_none(),
            interactive: tty,
        }
    }

    /// Console over any writer, never interactive.
    pub fn new(out: Box<dyn Write>, color: bool) -> Self {
        Self {
            out,
            color,
            interactive: false,
        }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Raw writer for streamed output.
    pub fn writer(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    // ── Messages ─────────────────────────────────────────────────────

    pub fn line(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn error(&mut self, text: impl Display) {
        let msg = self.paint(&format!("error: {text}"), AnsiColors::Red);
        self.line(msg);
    }

    pub fn warn(&mut self, text: impl Display) {
        let msg = self.paint(&text.to_string(), AnsiColors::Yellow);
        self.line(msg);
    }

    pub fn success(&mut self, text: impl Display) {
        let msg = self.paint(&text.to_string(), AnsiColors::Green);
        self.line(msg);
    }

    /// `key: value` lines with the keys aligned.
    pub fn fields(&mut self, fields: &[(&str, String)]) {
        let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in fields {
            let key = self.paint(&format!("{key:>width$}"), AnsiColors::Cyan);
            self.line(format_args!("{key}: {value}"));
        }
    }

    pub fn table<R: Tabled>(&mut self, rows: &[R]) {
        if rows.is_empty() {
            self.warn("No results");
            return;
        }
        let table = Table::new(rows).with(Style::rounded()).to_string();
        self.line(table);
    }

    /// `text` in `color` when colour is on.
    pub fn paint(&self, text: &str, color: AnsiColors) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_owned()
        }
    }

    /// Spinner on stderr while a request runs; hidden when not on a
    /// terminal.
    pub fn spinner(&self, message: impl Into<String>) -> ProgressBar {
        if !self.interactive {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}
