//! `berth generate`: manifest in, compose file out.

use serde::Serialize;
use tracing::instrument;

use berth_adapters::{YamlComposeWriter, YamlManifestLoader};
use berth_core::application::{GenerateReport, GenerateRequest, GenerateService};
use berth_core::domain::ComposeSynthesizer;

use crate::{
    cli::GenerateArgs,
    commands::{build_allocator, build_publisher},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(path = %args.path.display()))]
pub fn execute(args: GenerateArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let mut service = GenerateService::new(
        Box::new(YamlManifestLoader::new()),
        build_allocator(&config)?,
        ComposeSynthesizer::new(config.compose.version.clone()),
        Box::new(YamlComposeWriter::new()),
    )
    .with_compose_file_name(config.compose.file_name.clone());

    if config.publish.enabled && !args.no_publish {
        service = service.with_publisher(build_publisher(&config));
    }

    let request = GenerateRequest {
        project_path: args.path,
        output: args.output,
        reset_ports: args.reset_ports,
        prune_stale: !args.no_prune,
    };
    let report = service.generate(&request)?;

    if output.is_json() {
        output.json(&GenerateSummary::from(&report))?;
    } else {
        render(&report, &output)?;
    }
    Ok(())
}

fn render(report: &GenerateReport, output: &OutputManager) -> CliResult<()> {
    if output.is_quiet() {
        return Ok(());
    }

    output.success(&format!(
        "Wrote {} for project '{}'",
        report.compose_path.display(),
        report.project
    ))?;

    if report.ports.is_empty() {
        output.info("No service exposes a port")?;
    } else {
        output.header("Ports")?;
        for (service, ports) in report.ports.iter() {
            for (internal, host) in ports {
                output.print(&format!("  {service:<16} {host:>5} -> {internal}"))?;
            }
        }
    }

    if report.pruned > 0 {
        output.info(&format!("Released {} port(s) no longer declared", report.pruned))?;
    }

    if let Some(publish) = &report.publish {
        if !publish.endpoints.is_empty() {
            output.header("Endpoints")?;
            for endpoint in &publish.endpoints {
                let named = if publish.published() {
                    endpoint.named_url()
                } else {
                    String::new()
                };
                output.print(&format!(
                    "  {:<16} {:<24} {named}",
                    endpoint.service,
                    endpoint.port_url()
                ))?;
            }
        }
        for warning in publish.warnings() {
            output.warning(&warning)?;
        }
    }

    Ok(())
}

/// JSON shape of a generate run.
#[derive(Debug, Serialize)]
struct GenerateSummary {
    project: String,
    compose_path: String,
    ports: Vec<PortLine>,
    pruned: usize,
    published: bool,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PortLine {
    service: String,
    internal_port: u16,
    host_port: u16,
}

impl From<&GenerateReport> for GenerateSummary {
    fn from(report: &GenerateReport) -> Self {
        let ports = report
            .ports
            .iter()
            .flat_map(|(service, ports)| {
                ports.iter().map(move |(internal, host)| PortLine {
                    service: service.to_string(),
                    internal_port: *internal,
                    host_port: *host,
                })
            })
            .collect();

        Self {
            project: report.project.to_string(),
            compose_path: report.compose_path.display().to_string(),
            ports,
            pruned: report.pruned,
            published: report.publish.as_ref().is_some_and(|p| p.published()),
            warnings: report
                .publish
                .as_ref()
                .map(|p| p.warnings())
                .unwrap_or_default(),
        }
    }
}
