//! Externally reachable URLs derived from a resolved port map.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::domain::entities::ResolvedPortMap;

/// Web and console ports, most preferred first.
///
/// A service exposing one of these surfaces it as its URL even when it also
/// exposes a protocol port (RabbitMQ's 15672 over 5672, MinIO's 9001 over
/// 9000, Mailpit's 8025 over 1025).
pub const PRIMARY_PORT_PREFERENCE: [u16; 12] = [
    80, 443, 8080, 3000, 8000, 5173, 15672, 9001, 8025, 5601, 8081, 8888,
];

/// Domain suffix used for named URLs when none is configured.
pub const DEFAULT_DOMAIN_SUFFIX: &str = "localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub service: String,
    pub internal_port: u16,
    pub host_port: u16,
    /// `<service>.<project>.<suffix>`
    pub hostname: String,
}

impl Endpoint {
    pub fn port_url(&self) -> String {
        format!("http://localhost:{}", self.host_port)
    }

    pub fn named_url(&self) -> String {
        format!("http://{}", self.hostname)
    }
}

/// Pick the `(internal, host)` pair a service is reached through.
pub fn primary_port(ports: &BTreeMap<u16, u16>) -> Option<(u16, u16)> {
    PRIMARY_PORT_PREFERENCE
        .iter()
        .find_map(|p| ports.get(p).map(|host| (*p, *host)))
        .or_else(|| ports.iter().next().map(|(i, h)| (*i, *h)))
}

pub fn hostname(project: &str, service: &str, domain_suffix: &str) -> String {
    let suffix = domain_suffix.trim_matches('.');
    if suffix.is_empty() {
        format!("{service}.{project}")
    } else {
        format!("{service}.{project}.{suffix}")
    }
}

/// One endpoint per service that has at least one resolved port.
pub fn derive_endpoints(
    project: &str,
    ports: &ResolvedPortMap,
    domain_suffix: &str,
) -> Vec<Endpoint> {
    ports
        .iter()
        .filter_map(|(service, map)| {
            let (internal_port, host_port) = primary_port(map)?;
            Some(Endpoint {
                service: service.to_string(),
                internal_port,
                host_port,
                hostname: hostname(project, service, domain_suffix),
            })
        })
        .collect()
}

/// Markdown access summary for a project.
pub fn render_access_summary(
    project: &str,
    ports: &ResolvedPortMap,
    endpoints: &[Endpoint],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {project}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated by berth. Host ports stay fixed until `berth ports release {project}` or `berth generate --reset-ports`."
    );
    let _ = writeln!(out);

    if endpoints.is_empty() {
        let _ = writeln!(out, "No service exposes a port.");
        return out;
    }

    let _ = writeln!(out, "| Service | Ports | URL | Named URL |");
    let _ = writeln!(out, "|---------|-------|-----|-----------|");
    for endpoint in endpoints {
        let mappings = ports
            .service(&endpoint.service)
            .map(|map| {
                map.iter()
                    .map(|(internal, host)| format!("{host} -> {internal}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            endpoint.service,
            mappings,
            endpoint.port_url(),
            endpoint.named_url()
        );
    }
    out
}
