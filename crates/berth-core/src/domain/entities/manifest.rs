//! The per-project service manifest.
//!
//! Two layers live here:
//!
//! - [`ManifestDocument`] mirrors the on-disk file. It is permissive: YAML
//!   scalars are accepted where strings are expected, list or map forms are
//!   both allowed, and nothing is cross-checked.
//! - [`Manifest`] is the validated model the rest of the engine consumes.
//!   It is built once by [`Manifest::from_document`] and never mutated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entities::ports::{PortRequest, PortSpec};
use crate::domain::error::DomainError;
use crate::domain::value_objects::ProjectName;

/// Restart policy applied when a service does not declare one.
pub const DEFAULT_RESTART_POLICY: &str = "unless-stopped";

/// Dockerfile used when a build context is given without one.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

// ── On-disk document ─────────────────────────────────────────────────────────

/// Deserialised representation of `berth.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDocument>,
    /// `dbdata:` with no body is allowed, hence the `Option`.
    #[serde(default)]
    pub volumes: BTreeMap<String, Option<VolumeSpec>>,
    #[serde(default)]
    pub networks: BTreeMap<String, Option<NetworkSpec>>,
}

/// One entry under `services:` as written in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceDocument {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub build: Option<BuildDocument>,
    #[serde(default)]
    pub command: Option<Command>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub ports: Vec<ScalarValue>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub environment: Option<EnvironmentDocument>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub restart: Option<String>,
    #[serde(default)]
    pub networks: Vec<String>,
}

/// `build: .` or `build: { context, dockerfile }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BuildDocument {
    Context(String),
    Full {
        #[serde(default)]
        context: Option<String>,
        #[serde(default)]
        dockerfile: Option<String>,
    },
}

/// `environment:` as a map or as a `KEY=value` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentDocument {
    Map(BTreeMap<String, Option<ScalarValue>>),
    List(Vec<String>),
}

/// Any YAML scalar, kept so `3306` and `"3306"` read the same.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Validated model ──────────────────────────────────────────────────────────

/// How a service obtains its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildKind {
    Image { image: String },
    Build { context: String, dockerfile: String },
}

/// A container command: shell form or exec form.
///
/// Passed through synthesis exactly as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    Single(String),
    Args(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub build: BuildKind,
    pub command: Option<Command>,
    pub working_dir: Option<String>,
    /// Declared `[host:]container[/proto]` strings, in manifest order.
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    /// `None` is a bare key: the value comes from the host environment.
    pub environment: BTreeMap<String, Option<String>>,
    pub depends_on: Vec<String>,
    pub restart: String,
    pub networks: Vec<String>,
}

impl ServiceSpec {
    /// A service running a published image.
    pub fn image(image: impl Into<String>) -> Self {
        Self::with_build(BuildKind::Image {
            image: image.into(),
        })
    }

    /// A service built from a local context.
    pub fn build(context: impl Into<String>, dockerfile: impl Into<String>) -> Self {
        Self::with_build(BuildKind::Build {
            context: context.into(),
            dockerfile: dockerfile.into(),
        })
    }

    fn with_build(build: BuildKind) -> Self {
        Self {
            build,
            command: None,
            working_dir: None,
            ports: Vec::new(),
            volumes: Vec::new(),
            environment: BTreeMap::new(),
            depends_on: Vec::new(),
            restart: DEFAULT_RESTART_POLICY.to_string(),
            networks: Vec::new(),
        }
    }

    pub fn port(mut self, spec: impl Into<String>) -> Self {
        self.ports.push(spec.into());
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.networks.push(network.into());
        self
    }

    pub fn depends_on(mut self, service: impl Into<String>) -> Self {
        self.depends_on.push(service.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), Some(value.into()));
        self
    }

    /// Container ports of every declared mapping that parses.
    ///
    /// Mappings that do not parse are left to pass through synthesis as-is.
    pub fn internal_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports
            .iter()
            .filter_map(|p| PortSpec::parse(p).ok())
            .map(|p| p.container_port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VolumeSpec {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub driver_opts: BTreeMap<String, String>,
    #[serde(default)]
    pub external: bool,
    #[serde(default, alias = "name")]
    pub external_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkSpec {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub driver_opts: BTreeMap<String, String>,
    #[serde(default)]
    pub external: bool,
}

/// A validated project manifest. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: ProjectName,
    pub framework: Option<String>,
    pub language: Option<String>,
    pub services: BTreeMap<String, ServiceSpec>,
    pub volumes: BTreeMap<String, VolumeSpec>,
    pub networks: BTreeMap<String, NetworkSpec>,
}

impl Manifest {
    pub fn new(name: ProjectName) -> Self {
        Self {
            name,
            framework: None,
            language: None,
            services: BTreeMap::new(),
            volumes: BTreeMap::new(),
            networks: BTreeMap::new(),
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_service(mut self, name: impl Into<String>, spec: ServiceSpec) -> Self {
        self.services.insert(name.into(), spec);
        self
    }

    pub fn with_volume(mut self, name: impl Into<String>, spec: VolumeSpec) -> Self {
        self.volumes.insert(name.into(), spec);
        self
    }

    pub fn with_network(mut self, name: impl Into<String>, spec: NetworkSpec) -> Self {
        self.networks.insert(name.into(), spec);
        self
    }

    /// Build a validated manifest from a parsed document.
    ///
    /// `fallback_name` is used when the document has no `name:`; loaders
    /// pass the project directory name.
    pub fn from_document(doc: ManifestDocument, fallback_name: &str) -> Result<Self, DomainError> {
        let name = ProjectName::parse(doc.name.as_deref().unwrap_or(fallback_name))?;

        let mut services = BTreeMap::new();
        for (service_name, service) in doc.services {
            let spec = convert_service(&service_name, service)?;
            services.insert(service_name, spec);
        }

        let manifest = Self {
            name,
            framework: doc.framework.filter(|f| !f.trim().is_empty()),
            language: doc.language.filter(|l| !l.trim().is_empty()),
            services,
            volumes: doc
                .volumes
                .into_iter()
                .map(|(k, v)| (k, v.unwrap_or_default()))
                .collect(),
            networks: doc
                .networks
                .into_iter()
                .map(|(k, v)| (k, v.unwrap_or_default()))
                .collect(),
        };

        manifest.validate()?;
        Ok(manifest)
    }

    /// Cross-field checks: services exist, references resolve.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.services.is_empty() {
            return Err(DomainError::InvalidManifest(
                "at least one service must be declared".into(),
            ));
        }

        for (name, service) in &self.services {
            validate_service_name(name)?;

            for dep in &service.depends_on {
                if dep == name {
                    return Err(DomainError::InvalidService {
                        service: name.clone(),
                        reason: "a service cannot depend on itself".into(),
                    });
                }
                if !self.services.contains_key(dep) {
                    return Err(DomainError::UnknownDependency {
                        service: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }

            // Without top-level networks every service joins the project
            // network, so any reference here would be dropped.
            if let Some(network) = service
                .networks
                .iter()
                .find(|n| !self.networks.contains_key(*n))
            {
                return Err(DomainError::UnknownNetwork {
                    service: name.clone(),
                    network: network.clone(),
                });
            }
        }

        Ok(())
    }

    /// Whether the manifest declares any top-level network.
    pub fn has_networks(&self) -> bool {
        !self.networks.is_empty()
    }

    /// Every internal port that needs a host port, per service.
    pub fn port_requirements(&self) -> PortRequest {
        let mut request = PortRequest::new();
        for (name, service) in &self.services {
            for port in service.internal_ports() {
                request.add(name.as_str(), port);
            }
        }
        request
    }

    /// Services that declare at least one port, in name order.
    pub fn exposed_services(&self) -> BTreeSet<&str> {
        self.services
            .iter()
            .filter(|(_, s)| s.internal_ports().next().is_some())
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

fn validate_service_name(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();
    let valid_first = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid_first && valid_rest {
        Ok(())
    } else {
        Err(DomainError::InvalidService {
            service: name.to_string(),
            reason: "service names use letters, digits, '-', '_' and '.'".into(),
        })
    }
}

fn convert_service(name: &str, doc: ServiceDocument) -> Result<ServiceSpec, DomainError> {
    // `build` wins over `image`: the synthesized tag names the built image.
    let build = match (doc.build, doc.image) {
        (Some(BuildDocument::Context(context)), _) => BuildKind::Build {
            context,
            dockerfile: DEFAULT_DOCKERFILE.to_string(),
        },
        (Some(BuildDocument::Full {
            context,
            dockerfile,
        }), _) => BuildKind::Build {
            context: context.unwrap_or_else(|| ".".to_string()),
            dockerfile: dockerfile.unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string()),
        },
        (None, Some(image)) if !image.trim().is_empty() => BuildKind::Image { image },
        (None, _) => {
            return Err(DomainError::InvalidService {
                service: name.to_string(),
                reason: "either `image` or `build` is required".into(),
            });
        }
    };

    let environment = match doc.environment {
        None => BTreeMap::new(),
        Some(EnvironmentDocument::Map(map)) => map
            .into_iter()
            .map(|(k, v)| (k, v.map(|v| v.to_string())))
            .collect(),
        Some(EnvironmentDocument::List(items)) => {
            let mut env = BTreeMap::new();
            for item in items {
                let (key, value) = match item.split_once('=') {
                    Some((key, value)) => (key, Some(value.to_string())),
                    None => (item.as_str(), None),
                };
                if env.insert(key.to_string(), value).is_some() {
                    return Err(DomainError::DuplicateEnvironmentKey {
                        service: name.to_string(),
                        key: key.to_string(),
                    });
                }
            }
            env
        }
    };

    Ok(ServiceSpec {
        build,
        command: doc.command,
        working_dir: doc.working_dir,
        ports: doc.ports.iter().map(ToString::to_string).collect(),
        volumes: doc.volumes,
        environment,
        depends_on: doc.depends_on,
        restart: doc
            .restart
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RESTART_POLICY.to_string()),
        networks: doc.networks,
    })
}
