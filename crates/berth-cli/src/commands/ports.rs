//! `berth ports`: look at and release ledger entries.

use serde::Serialize;
use tracing::instrument;

use berth_core::application::StepOutcome;
use berth_core::domain::{LedgerEntry, ProjectName};
use berth_core::error::BerthError;

use crate::{
    cli::{ListFormat, PortsCommands, PortsListArgs, PortsReleaseArgs},
    commands::{build_allocator, build_publisher},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(cmd: PortsCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cmd {
        PortsCommands::List(args) => list(args, &config, &output),
        PortsCommands::Release(args) => release(args, &config, &output),
    }
}

#[derive(Debug, Serialize)]
struct EntryRow<'a> {
    project: &'a str,
    service: &'a str,
    internal_port: u16,
    host_port: u16,
}

impl<'a> From<&'a LedgerEntry> for EntryRow<'a> {
    fn from(entry: &'a LedgerEntry) -> Self {
        Self {
            project: &entry.key.project,
            service: &entry.key.service,
            internal_port: entry.key.internal_port,
            host_port: entry.host_port,
        }
    }
}

fn list(args: PortsListArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let project = args
        .project
        .as_deref()
        .map(|name| ProjectName::parse(name))
        .transpose()
        .map_err(BerthError::from)?;
    let allocator = build_allocator(config)?;
    let entries = allocator.assignments(project.as_ref().map(ProjectName::as_str))?;

    if args.format == ListFormat::Json || output.is_json() {
        let rows: Vec<EntryRow<'_>> = entries.iter().map(EntryRow::from).collect();
        output.json(&rows)?;
        return Ok(());
    }

    if entries.is_empty() {
        output.info("No ports reserved")?;
        return Ok(());
    }

    output.header(&format!("{:<20} {:<16} {:>8} {:>6}", "PROJECT", "SERVICE", "INTERNAL", "HOST"))?;
    for line in table_lines(&entries) {
        output.print(&line)?;
    }
    Ok(())
}

fn table_lines(entries: &[LedgerEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            format!(
                "{:<20} {:<16} {:>8} {:>6}",
                e.key.project, e.key.service, e.key.internal_port, e.host_port
            )
        })
        .collect()
}

#[instrument(skip_all, fields(project = %args.project))]
fn release(args: PortsReleaseArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let project = ProjectName::parse(&args.project).map_err(BerthError::from)?;
    let allocator = build_allocator(config)?;

    let held = allocator.assignments(Some(project.as_str()))?;
    if held.is_empty() {
        withdraw_routes(&project, config, output)?;
        output.info(&format!("Project '{project}' holds no ports"))?;
        return Ok(());
    }

    if !args.yes {
        let question = format!("Release {} port(s) held by '{project}'?", held.len());
        if !confirm(&question)? {
            return Err(CliError::Cancelled);
        }
    }

    let released = allocator.release_project(project.as_str())?;
    withdraw_routes(&project, config, output)?;
    output.success(&format!("Released {released} port(s) for '{project}'"))?;
    Ok(())
}

/// Released host ports are handed to the next project, so the names that
/// pointed at them go too. A failure only warns.
fn withdraw_routes(
    project: &ProjectName,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    if !config.publish.enabled {
        return Ok(());
    }
    if let StepOutcome::Failed(reason) = build_publisher(config).withdraw(project) {
        output.warning(&format!("name resolution: {reason}"))?;
    }
    Ok(())
}

/// Ask a yes/no question; anything but an explicit yes is a no.
fn confirm(question: &str) -> CliResult<bool> {
    #[cfg(feature = "interactive")]
    {
        use std::io::IsTerminal as _;

        if std::io::stdin().is_terminal() {
            return dialoguer::Confirm::new()
                .with_prompt(question)
                .default(false)
                .interact()
                .map_err(|e| CliError::IoError {
                    message: "failed to read confirmation".into(),
                    source: std::io::Error::other(e),
                });
        }
    }

    confirm_plain(question)
}

fn confirm_plain(question: &str) -> CliResult<bool> {
    use std::io::{self, Write};

    print!("{question} [y/N] ");
    io::stdout().flush().map_err(|e| CliError::IoError {
        message: "failed to flush stdout".into(),
        source: e,
    })?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: e,
        })?;

    Ok(is_yes(&input))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::domain::LedgerKey;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("sure"));
    }

    #[test]
    fn table_lines_align_columns() {
        let entries = vec![LedgerEntry {
            key: LedgerKey::new("shop", "db", 5432),
            host_port: 10000,
        }];
        let lines = table_lines(&entries);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("shop "));
        assert!(lines[0].trim_end().ends_with("5432  10000"));
    }

    #[test]
    fn rows_serialize_flat() {
        let entry = LedgerEntry {
            key: LedgerKey::new("shop", "app", 80),
            host_port: 10001,
        };
        let json = serde_json::to_value(EntryRow::from(&entry)).unwrap();
        assert_eq!(json["project"], "shop");
        assert_eq!(json["service"], "app");
        assert_eq!(json["internal_port"], 80);
        assert_eq!(json["host_port"], 10001);
    }
}
