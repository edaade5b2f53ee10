//! `berth`: docker compose files whose host ports never collide across
//! the projects on one machine.
//!
//! Arguments are parsed before logging is installed, and configuration is
//! loaded after it, so `-vv` also traces config layering. Every failure ends
//! in [`handle_error`].
//!
//! | Exit | Meaning                                   |
//! |------|-------------------------------------------|
//! |  0   | Success                                   |
//! |  1   | Ledger corrupted, port space full, I/O    |
//! |  2   | Bad manifest, bad input, cancelled prompt |
//! |  3   | No manifest in the project directory      |
//! |  4   | Configuration error                       |
//! |  5   | Ledger locked by another berth (retry)    |

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    // Missing .env is fine.
    let _ = dotenvy::dotenv();

    // ── 1. Parse arguments ────────────────────────────────────────────────
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here and must exit 0.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // ── 2. Initialise tracing ─────────────────────────────────────────────
    if let Err(e) = init_logging(&cli.global) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::from(1);
    }

    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        no_color = cli.global.no_color,
        "CLI started"
    );

    // ── 3. Load configuration ─────────────────────────────────────────────
    let config = match AppConfig::load(cli.global.config.as_ref()) {
        Ok(mut cfg) => {
            if let Some(ledger) = &cli.global.ledger {
                cfg.ledger.path = ledger.clone();
            }
            cfg
        }
        Err(e) => {
            let err = CliError::ConfigError {
                message: format!("{e:#}"),
                source: None,
            };
            return handle_error(err, &cli.global);
        }
    };

    // ── 4. Build output manager ───────────────────────────────────────────
    let output = OutputManager::new(&cli.global, &config);

    // ── 5. Dispatch ───────────────────────────────────────────────────────
    let Cli { global, command } = cli;
    match run(command, config, output) {
        Ok(()) => {
            info!("berth completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => handle_error(e, &global),
    }
}

#[instrument(skip_all)]
fn run(command: Commands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match command {
        Commands::Generate(cmd) => commands::generate::execute(cmd, config, output),
        Commands::Ports(cmd) => commands::ports::execute(cmd, config, output),
        Commands::Init(cmd) => commands::init::execute(cmd, output),
        Commands::Config(cmd) => commands::config::execute(cmd, config, output),
        Commands::Completions(cmd) => commands::completions::execute(cmd),
    }
}

/// Log `err`, print its report to stderr and map it to an exit code.
fn handle_error(err: CliError, global: &GlobalArgs) -> ExitCode {
    err.log();

    let color = !global.no_color && std::io::IsTerminal::is_terminal(&std::io::stderr());
    eprint!("{}", err.render(global.verbose > 0, color));

    ExitCode::from(err.exit_code())
}

// ── tests ─────────────────────────────────────────────────────────────────────
