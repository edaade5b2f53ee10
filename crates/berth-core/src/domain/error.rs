// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (the allocator keeps the first failure while rolling back)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Service '{service}' is invalid: {reason}")]
    InvalidService { service: String, reason: String },

    #[error("Invalid port mapping '{spec}': {reason}")]
    InvalidPortSpec { spec: String, reason: String },

    #[error("Duplicate environment key '{key}' in service '{service}'")]
    DuplicateEnvironmentKey { service: String, key: String },

    // ========================================================================
    // Reference Errors (409-level equivalent)
    // ========================================================================
    #[error("Service '{service}' depends on unknown service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },

    #[error("Service '{service}' joins undeclared network '{network}'")]
    UnknownNetwork { service: String, network: String },

    // ========================================================================
    // Ledger Integrity
    // ========================================================================
    #[error("Host port {host_port} is assigned twice ({first} and {second})")]
    DuplicateHostPort {
        host_port: u16,
        first: String,
        second: String,
    },

    #[error("Ledger key {key} appears more than once")]
    DuplicateLedgerKey { key: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidProjectName { name, .. } => vec![
                format!("'{}' cannot be used as a compose project name", name),
                "Use lowercase letters, digits, '-' and '_'".into(),
                "Start with a letter or digit".into(),
                "Set `name:` explicitly in berth.yaml".into(),
            ],
            Self::InvalidManifest(msg) => vec![
                "Check your berth.yaml".into(),
                format!("Details: {}", msg),
            ],
            Self::InvalidService { service, .. } => vec![
                format!("Fix the definition of service '{}'", service),
                "Every service needs either `image:` or `build:`".into(),
            ],
            Self::InvalidPortSpec { .. } => vec![
                "Ports use the form [host:]container[/tcp|udp|sctp]".into(),
                "Example: \"80\", \"8080:80\", \"5353/udp\"".into(),
            ],
            Self::DuplicateEnvironmentKey { key, .. } => {
                vec![format!("Remove the repeated '{}=' entry", key)]
            }
            Self::UnknownDependency { dependency, .. } => vec![
                format!("Declare a service named '{}'", dependency),
                "Or remove it from `depends_on`".into(),
            ],
            Self::UnknownNetwork { network, .. } => vec![
                format!("Declare '{}' under the top-level `networks:`", network),
                "Or remove it from the service to join the default `<project>-network`".into(),
            ],
            Self::DuplicateHostPort { .. } | Self::DuplicateLedgerKey { .. } => vec![
                "The port ledger has been modified by hand or is damaged".into(),
                "Run `berth ports list` to inspect it".into(),
                "Release the affected project with `berth ports release <project>`".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidProjectName { .. }
            | Self::InvalidManifest(_)
            | Self::InvalidService { .. }
            | Self::InvalidPortSpec { .. }
            | Self::DuplicateEnvironmentKey { .. } => ErrorCategory::Validation,
            Self::UnknownDependency { .. } | Self::UnknownNetwork { .. } => {
                ErrorCategory::Reference
            }
            Self::DuplicateHostPort { .. } | Self::DuplicateLedgerKey { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Reference,
    Internal,
}
