//! Manifest + resolved ports → compose descriptor.
//!
//! Pure and deterministic: the same inputs always produce an equal
//! descriptor, and therefore byte-identical YAML once written.

use std::collections::BTreeMap;

use crate::domain::entities::{
    BuildKind, ComposeBuild, ComposeDescriptor, ComposeNetwork, ComposeService, ComposeVolume,
    Manifest, PortSpec, ResolvedPortMap, ServiceSpec,
};

/// Compose file format version written when none is configured.
pub const DEFAULT_COMPOSE_VERSION: &str = "3.8";

#[derive(Debug, Clone)]
pub struct ComposeSynthesizer {
    version: String,
}

impl Default for ComposeSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_COMPOSE_VERSION)
    }
}

impl ComposeSynthesizer {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn synthesize(&self, manifest: &Manifest, ports: &ResolvedPortMap) -> ComposeDescriptor {
        let project = manifest.name.as_str();
        let default_network = (!manifest.has_networks()).then(|| default_network_name(project));

        let services = manifest
            .services
            .iter()
            .map(|(name, spec)| {
                let mut service = synthesize_service(manifest, name, spec, ports);
                if let Some(network) = &default_network {
                    service.networks = vec![network.clone()];
                }
                (name.clone(), service)
            })
            .collect();

        let networks = match default_network {
            Some(network) => BTreeMap::from([(network, ComposeNetwork::bridge())]),
            None => manifest
                .networks
                .iter()
                .map(|(name, spec)| {
                    (
                        name.clone(),
                        ComposeNetwork {
                            driver: spec.driver.clone(),
                            driver_opts: spec.driver_opts.clone(),
                            external: spec.external,
                        },
                    )
                })
                .collect(),
        };

        let volumes = manifest
            .volumes
            .iter()
            .map(|(name, spec)| {
                (
                    name.clone(),
                    ComposeVolume {
                        driver: spec.driver.clone(),
                        driver_opts: spec.driver_opts.clone(),
                        external: spec.external,
                        name: spec.external_name.clone(),
                    },
                )
            })
            .collect();

        ComposeDescriptor {
            version: self.version.clone(),
            services,
            volumes,
            networks,
        }
    }
}

pub fn container_name(project: &str, service: &str) -> String {
    format!("{project}-{service}")
}

/// Tag for a locally built image. Without a framework the tag is
/// `<project>-<service>`.
pub fn image_tag(project: &str, framework: Option<&str>, service: &str) -> String {
    match framework {
        Some(framework) => format!("{project}-{framework}-{service}"),
        None => format!("{project}-{service}"),
    }
}

pub fn default_network_name(project: &str) -> String {
    format!("{project}-network")
}

fn synthesize_service(
    manifest: &Manifest,
    name: &str,
    spec: &ServiceSpec,
    ports: &ResolvedPortMap,
) -> ComposeService {
    let project = manifest.name.as_str();

    let (image, build) = match &spec.build {
        BuildKind::Image { image } => (image.clone(), None),
        BuildKind::Build {
            context,
            dockerfile,
        } => (
            image_tag(project, manifest.framework.as_deref(), name),
            Some(ComposeBuild {
                context: context.clone(),
                dockerfile: dockerfile.clone(),
            }),
        ),
    };

    ComposeService {
        container_name: container_name(project, name),
        image: Some(image),
        build,
        command: spec.command.clone(),
        working_dir: spec.working_dir.clone(),
        ports: spec
            .ports
            .iter()
            .map(|declared| render_port(name, declared, ports))
            .collect(),
        volumes: spec.volumes.clone(),
        environment: spec.environment.clone(),
        depends_on: spec.depends_on.clone(),
        restart: spec.restart.clone(),
        networks: spec.networks.clone(),
    }
}

/// Substitute the allocated host port, or echo the declaration verbatim.
fn render_port(service: &str, declared: &str, ports: &ResolvedPortMap) -> String {
    PortSpec::parse(declared)
        .ok()
        .and_then(|spec| {
            ports
                .host_port(service, spec.container_port)
                .map(|host| spec.with_host_port(host))
        })
        .unwrap_or_else(|| declared.to_string())
}
