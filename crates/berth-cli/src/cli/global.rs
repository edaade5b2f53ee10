//! Flags accepted before or after any subcommand.

use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log more: `-v` shows each step, `-vv` every port decision, `-vvv`
    /// lock and file traffic.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Only errors reach the terminal. JSON output is still printed.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Honours `NO_COLOR` (<https://no-color.org>).
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        help = "Disable colored output"
    )]
    pub no_color: bool,

    /// TOML file layered between built-in defaults and `BERTH_*` variables.
    /// Unlike the default location, a file named here must exist.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "Configuration file path"
    )]
    pub config: Option<PathBuf>,

    /// Use another port ledger for this run, overriding `ledger.path`.
    #[arg(
        long = "ledger",
        global = true,
        value_name = "FILE",
        help = "Port ledger file (default: ~/.berth/ports.json)"
    )]
    pub ledger: Option<PathBuf>,

    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "Output format"
    )]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain when piped, unless `output.format` says json.
    #[default]
    Auto,
    /// Coloured, with headers.
    Human,
    /// No colour, one fact per line.
    Plain,
    /// A single JSON document on stdout.
    Json,
}
