//! Everything commands print to stdout goes through [`OutputManager`], so
//! `--quiet`, `--no-color` and `--output-format` are honoured in one place.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// `auto` resolves to json when `output.format = "json"`, else human on
    /// a terminal and plain when piped. Colour survives only in human mode.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let resolved_format = match args.output_format {
            OutputFormat::Auto if config.output.format == "json" => OutputFormat::Json,
            OutputFormat::Auto if io::stdout().is_terminal() => OutputFormat::Human,
            OutputFormat::Auto => OutputFormat::Plain,
            explicit => explicit,
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Pretty JSON on stdout.  Not suppressed by `--quiet`: a caller asking
    /// for JSON always gets a parseable document.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.marked('\u{2713}', msg, |t| t.green().to_string())
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.marked('\u{26a0}', msg, |t| t.yellow().to_string())
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.marked('\u{2139}', msg, |t| t.blue().to_string())
    }

    /// Section title, e.g. `Ports` above the port table.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.no_color {
            self.print(text)
        } else {
            self.print(&text.cyan().bold().to_string())
        }
    }

    /// `<mark> <msg>`, both painted with `paint` unless colour is off.
    fn marked(&self, mark: char, msg: &str, paint: fn(&str) -> String) -> io::Result<()> {
        if self.no_color {
            return self.print(&format!("{mark} {msg}"));
        }
        let mark = mark.to_string();
        self.print(&format!("{} {}", paint(&mark).bold(), paint(msg)))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if quiet mode suppresses most output.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Whether commands should emit JSON instead of text.
    pub fn is_json(&self) -> bool {
        self.resolved_format == OutputFormat::Json
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
