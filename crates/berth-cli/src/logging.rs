//! Logging setup for the `berth` binary.
//!
//! Events go to stderr so that `--output-format json` keeps stdout clean.
//! The library crates only emit; this is the single place a subscriber is
//! installed.
//!
//! | Flag(s)   | Level |
//! |-----------|-------|
//! | (none)    | warn  |
//! | `-v`      | info  |
//! | `-vv`     | debug |
//! | `-vvv`    | trace |
//! | `--quiet` | error |
//!
//! `RUST_LOG` replaces the derived filter entirely.

use std::io::IsTerminal as _;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::GlobalArgs;

/// Crates whose events pass the default filter.
const LOG_TARGETS: [&str; 3] = ["berth", "berth_core", "berth_adapters"];

pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let level = derive_level(args);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(filter_directives(level)),
    };

    // Targets tell ledger, probe and writer events apart once debug is on.
    let detailed = args.verbose >= 2;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(!args.no_color && std::io::stderr().is_terminal())
        .with_target(detailed)
        .with_file(args.verbose >= 3)
        .with_line_number(args.verbose >= 3);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber already installed: {e}"))
}

/// Translate the verbosity counter + quiet flag to a level string.
fn derive_level(args: &GlobalArgs) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter_directives(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
