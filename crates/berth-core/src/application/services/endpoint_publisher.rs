//! Endpoint Publisher - best-effort advertising of a project's URLs.
//!
//! Nothing in here returns an error. Every step reports a [`StepOutcome`]
//! and failures are logged at `warn`; callers may inspect the
//! [`PublishReport`] or ignore it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::{
    application::ports::{Filesystem, NameResolver},
    domain::{
        DEFAULT_DOMAIN_SUFFIX, Endpoint, ProjectName, ResolvedPortMap, derive_endpoints,
        render_access_summary,
    },
};

/// File name of the access summary when none is configured.
pub const DEFAULT_SUMMARY_FILE: &str = "ACCESS.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => f.write_str("done"),
            Self::Skipped => f.write_str("skipped"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub endpoints: Vec<Endpoint>,
    pub resolver: StepOutcome,
    pub summary: StepOutcome,
}

impl PublishReport {
    /// Whether the name-resolution collaborator accepted the routes.
    pub fn published(&self) -> bool {
        self.resolver == StepOutcome::Done
    }

    /// Human-readable reasons for every failed step.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let StepOutcome::Failed(reason) = &self.resolver {
            out.push(format!("name resolution: {reason}"));
        }
        if let StepOutcome::Failed(reason) = &self.summary {
            out.push(format!("access summary: {reason}"));
        }
        out
    }
}

pub struct EndpointPublisher {
    resolver: Box<dyn NameResolver>,
    filesystem: Box<dyn Filesystem>,
    domain_suffix: String,
    summary_file: Option<String>,
}

impl EndpointPublisher {
    pub fn new(resolver: Box<dyn NameResolver>, filesystem: Box<dyn Filesystem>) -> Self {
        Self {
            resolver,
            filesystem,
            domain_suffix: DEFAULT_DOMAIN_SUFFIX.to_string(),
            summary_file: Some(DEFAULT_SUMMARY_FILE.to_string()),
        }
    }

    #[must_use]
    pub fn with_domain_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.domain_suffix = suffix.into();
        self
    }

    /// `None` disables the access summary.
    #[must_use]
    pub fn with_summary_file(mut self, file: Option<String>) -> Self {
        self.summary_file = file.filter(|f| !f.trim().is_empty());
        self
    }

    /// Advertise `ports` and write the access summary into `project_dir`.
    ///
    /// A project that exposes nothing has its previous names withdrawn, so
    /// no hostname keeps pointing at a port the ledger has handed on.
    #[instrument(skip_all, fields(project = %project))]
    pub fn publish(
        &self,
        project: &ProjectName,
        ports: &ResolvedPortMap,
        project_dir: &Path,
    ) -> PublishReport {
        let endpoints = derive_endpoints(project.as_str(), ports, &self.domain_suffix);

        let resolver = if endpoints.is_empty() {
            debug!("no exposed ports, withdrawing previous names");
            self.withdraw(project)
        } else {
            let routes: BTreeMap<String, u16> = endpoints
                .iter()
                .map(|e| (e.service.clone(), e.host_port))
                .collect();
            match self.resolver.add_project(project.as_str(), &routes) {
                Ok(()) => StepOutcome::Done,
                Err(e) => {
                    warn!(error = %e, "Publishing hostnames failed");
                    StepOutcome::Failed(e.to_string())
                }
            }
        };

        let summary = match &self.summary_file {
            None => StepOutcome::Skipped,
            Some(file) => {
                let path = project_dir.join(file);
                let content = render_access_summary(project.as_str(), ports, &endpoints);
                match self.filesystem.write_file(&path, &content) {
                    Ok(()) => StepOutcome::Done,
                    Err(e) => {
                        warn!(
                            error = %e,
                            path = %path.display(),
                            "Writing access summary failed"
                        );
                        StepOutcome::Failed(e.to_string())
                    }
                }
            }
        };

        info!(%resolver, %summary, endpoints = endpoints.len(), "Publish finished");
        PublishReport {
            endpoints,
            resolver,
            summary,
        }
    }

    /// Remove every name advertised for `project`, e.g. after its ports
    /// were released.
    #[instrument(skip_all, fields(project = %project))]
    pub fn withdraw(&self, project: &ProjectName) -> StepOutcome {
        match self.resolver.remove_project(project.as_str()) {
            Ok(()) => StepOutcome::Done,
            Err(e) => {
                warn!(error = %e, "Withdrawing hostnames failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }
}
