//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `berth-adapters` crate provides implementations.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use crate::domain::{ComposeDescriptor, LedgerEntry, LedgerKey, Manifest, ReserveOutcome};
use crate::error::BerthResult;

/// Port for reading a project's manifest.
///
/// Implemented by:
/// - `berth_adapters::YamlManifestLoader` (`berth.yaml` / `berth.yml`)
#[cfg_attr(test, mockall::automock)]
pub trait ManifestLoader: Send + Sync {
    /// Load and validate the manifest of the project rooted at `project_path`.
    ///
    /// Fails with `ManifestNotFound` when no manifest file exists and with
    /// `ManifestParse` when the file is not well-formed.
    fn load(&self, project_path: &Path) -> BerthResult<Manifest>;
}

/// Port for the machine-wide port ledger.
///
/// Implemented by:
/// - `berth_adapters::FilePortLedger` (production, shared across processes)
/// - `berth_adapters::InMemoryPortLedger` (testing)
///
/// ## Contract
///
/// - Every mutating call is one atomic read-modify-write cycle. A crash in
///   the middle leaves the previous table intact.
/// - `reserve` reports a conflict as a value, not an error. Only I/O,
///   lock timeouts and corruption are errors.
/// - Implementations that share state between processes bound their lock
///   wait and fail with `LedgerBusy` instead of blocking.
#[cfg_attr(test, mockall::automock)]
pub trait PortLedger: Send + Sync {
    fn get(&self, key: &LedgerKey) -> BerthResult<Option<u16>>;

    /// Bind `key` to `host_port` unless a different live key holds it.
    fn reserve(&self, key: &LedgerKey, host_port: u16) -> BerthResult<ReserveOutcome>;

    /// Drop the given keys in one cycle. Returns how many existed.
    fn release(&self, keys: &[LedgerKey]) -> BerthResult<usize>;

    /// Drop every entry of `project`. Returns how many existed.
    fn release_project(&self, project: &str) -> BerthResult<usize>;

    fn live_host_ports(&self) -> BerthResult<BTreeSet<u16>>;

    /// Snapshot of all entries, ordered by key.
    fn entries(&self) -> BerthResult<Vec<LedgerEntry>>;
}

impl<T: PortLedger + ?Sized> PortLedger for Arc<T> {
    fn get(&self, key: &LedgerKey) -> BerthResult<Option<u16>> {
        (**self).get(key)
    }

    fn reserve(&self, key: &LedgerKey, host_port: u16) -> BerthResult<ReserveOutcome> {
        (**self).reserve(key, host_port)
    }

    fn release(&self, keys: &[LedgerKey]) -> BerthResult<usize> {
        (**self).release(keys)
    }

    fn release_project(&self, project: &str) -> BerthResult<usize> {
        (**self).release_project(project)
    }

    fn live_host_ports(&self) -> BerthResult<BTreeSet<u16>> {
        (**self).live_host_ports()
    }

    fn entries(&self) -> BerthResult<Vec<LedgerEntry>> {
        (**self).entries()
    }
}

/// Port for checking whether another process already listens on a port.
///
/// Implemented by:
/// - `berth_adapters::TcpPortProbe` (bind-and-release)
/// - `berth_adapters::NoProbe` (never bound)
#[cfg_attr(test, mockall::automock)]
pub trait PortProbe: Send + Sync {
    fn is_bound(&self, port: u16) -> bool;
}

/// Port for persisting a synthesized compose descriptor.
///
/// Implemented by:
/// - `berth_adapters::YamlComposeWriter`
#[cfg_attr(test, mockall::automock)]
pub trait ComposeWriter: Send + Sync {
    /// Write `descriptor` to `path`, replacing any previous file atomically.
    fn write(&self, descriptor: &ComposeDescriptor, path: &Path) -> BerthResult<()>;
}

/// Port for the local name-resolution collaborator.
///
/// Implemented by:
/// - `berth_adapters::RouteFileResolver` (JSON route table)
/// - `berth_adapters::NullResolver` (publishing disabled)
#[cfg_attr(test, mockall::automock)]
pub trait NameResolver: Send + Sync {
    /// Advertise `service → external port` for `project`, replacing whatever
    /// was advertised for it before.
    fn add_project(&self, project: &str, services: &BTreeMap<String, u16>) -> BerthResult<()>;

    /// Drop every name advertised for `project`. Unknown projects are a no-op.
    fn remove_project(&self, project: &str) -> BerthResult<()>;
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `berth_adapters::LocalFilesystem` (production)
/// - `berth_adapters::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> BerthResult<()>;

    /// Write content to a file, creating or truncating it.
    fn write_file(&self, path: &Path, content: &str) -> BerthResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}
