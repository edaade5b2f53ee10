//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not broken
//! business rules. Those are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// No manifest file in the project directory.
    #[error("No manifest found in {path}")]
    ManifestNotFound { path: PathBuf },

    /// The manifest exists but is not well-formed.
    #[error("Failed to parse manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    /// No free host port within the scan bound.
    #[error(
        "No free host port for {project}/{service}:{internal_port} after scanning {scanned} candidates"
    )]
    PortSpaceExhausted {
        project: String,
        service: String,
        internal_port: u16,
        scanned: u32,
    },

    /// The ledger lock could not be acquired in time.
    #[error("Port ledger {path} is busy (waited {waited_ms} ms)")]
    LedgerBusy { path: PathBuf, waited_ms: u64 },

    /// The ledger file exists but violates its own invariants.
    #[error("Port ledger {path} is corrupted: {reason}")]
    LedgerCorrupted { path: PathBuf, reason: String },

    /// Reading or replacing the ledger failed.
    #[error("Port ledger I/O error at {path}: {reason}")]
    LedgerIo { path: PathBuf, reason: String },

    /// The compose file could not be written.
    #[error("Failed to write {path}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },

    /// The name-resolution collaborator rejected an update.
    #[error("Publishing endpoints failed: {reason}")]
    PublishFailed { reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ManifestNotFound { path } => vec![
                format!("Create berth.yaml in {}", path.display()),
                "Or pass the project directory: berth generate <PATH>".into(),
            ],
            Self::ManifestParse { reason, .. } => vec![
                "Fix the YAML syntax in berth.yaml".into(),
                format!("Parser said: {}", reason),
            ],
            Self::PortSpaceExhausted { .. } => vec![
                "Release ports of projects you no longer use: berth ports release <project>".into(),
                "Raise the scan width: BERTH_PORTS__MAX_SCAN=20000".into(),
                "Or move the scan start: BERTH_PORTS__BASE=20000".into(),
            ],
            Self::LedgerBusy { .. } => vec![
                "Another berth process is updating the port ledger".into(),
                "Try again in a moment".into(),
                "Raise the wait with BERTH_LEDGER__LOCK_TIMEOUT_MS".into(),
            ],
            Self::LedgerCorrupted { path, .. } => vec![
                format!("Inspect or restore {}", path.display()),
                "The file is never rewritten while it is corrupted".into(),
            ],
            Self::LedgerIo { path, .. } | Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::WriteFailure { path, .. } => vec![
                format!("Check that {} is writable", path.display()),
                "Ensure the disk is not full".into(),
            ],
            Self::PublishFailed { .. } => vec!["Run with -v for details".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ManifestNotFound { .. } => ErrorCategory::NotFound,
            Self::ManifestParse { .. } => ErrorCategory::Validation,
            Self::PortSpaceExhausted { .. } => ErrorCategory::Resource,
            Self::LedgerBusy { .. } => ErrorCategory::Busy,
            Self::LedgerCorrupted { .. } => ErrorCategory::Internal,
            Self::LedgerIo { .. }
            | Self::WriteFailure { .. }
            | Self::FilesystemError { .. }
            | Self::PublishFailed { .. } => ErrorCategory::Io,
        }
    }
}
