//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "berth",
    bin_name = "berth",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{2693} Collision-free docker compose files for local projects",
    long_about = "berth turns a project's berth.yaml into a docker-compose.yml, \
                  giving every exposed container port a host port that no other \
                  project on this machine holds.",
    after_help = "EXAMPLES:\n\
        \x20 berth generate\n\
        \x20 berth generate ./shop --reset-ports\n\
        \x20 berth ports list --project shop\n\
        \x20 berth completions bash > /usr/share/bash-completion/completions/berth",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Allocate ports and write the compose file.
    #[command(
        visible_alias = "gen",
        about = "Generate docker-compose.yml from berth.yaml",
        after_help = "EXAMPLES:\n\
            \x20 berth generate\n\
            \x20 berth generate ./shop --output compose/dev.yml\n\
            \x20 berth generate --reset-ports --no-publish"
    )]
    Generate(GenerateArgs),

    /// Inspect or release ledger entries.
    #[command(
        about = "Inspect and release reserved host ports",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 berth ports list\n\
            \x20 berth ports list --project shop --format json\n\
            \x20 berth ports release shop --yes"
    )]
    Ports(PortsCommands),

    /// Initialise a berth configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 berth init\n\
            \x20 berth init --path ./berth.toml --force"
    )]
    Init(InitArgs),

    /// Manage the berth configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 berth config get ports.base\n\
            \x20 berth config list\n\
            \x20 berth config path"
    )]
    Config(ConfigCommands),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 berth completions bash > ~/.local/share/bash-completion/completions/berth\n\
            \x20 berth completions zsh  > ~/.zfunc/_berth\n\
            \x20 berth completions fish > ~/.config/fish/completions/berth.fish"
    )]
    Completions(CompletionsArgs),
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `berth generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Project directory (or the manifest file itself).
    #[arg(value_name = "PATH", default_value = ".", help = "Project directory")]
    pub path: PathBuf,

    /// Where to write the compose file.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Compose file to write (relative paths resolve against PATH)"
    )]
    pub output: Option<PathBuf>,

    /// Drop the project's reservations and allocate fresh host ports.
    #[arg(long = "reset-ports", help = "Release and re-allocate this project's ports")]
    pub reset_ports: bool,

    /// Keep reservations for ports the manifest no longer declares.
    #[arg(long = "no-prune", help = "Keep ports the manifest no longer declares")]
    pub no_prune: bool,

    /// Skip route publishing and the access summary.
    #[arg(long = "no-publish", help = "Do not publish routes or write ACCESS.md")]
    pub no_publish: bool,
}

// ── ports ─────────────────────────────────────────────────────────────────────

/// Subcommands for `berth ports`.
#[derive(Debug, Subcommand)]
pub enum PortsCommands {
    /// Show reserved host ports.
    #[command(visible_alias = "ls")]
    List(PortsListArgs),

    /// Release every port a project holds.
    Release(PortsReleaseArgs),
}

/// Arguments for `berth ports list`.
#[derive(Debug, Args)]
pub struct PortsListArgs {
    /// Only show one project.
    #[arg(short = 'p', long = "project", value_name = "NAME", help = "Filter by project")]
    pub project: Option<String>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for `ports list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// JSON array.
    Json,
}

/// Arguments for `berth ports release`.
#[derive(Debug, Args)]
pub struct PortsReleaseArgs {
    /// Project whose ports are released.
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Release without asking")]
    pub yes: bool,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `berth init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write somewhere other than the platform config directory.
    #[arg(long = "path", value_name = "FILE", help = "Where to write the config file")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `berth completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `berth config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `ports.base`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the default configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
