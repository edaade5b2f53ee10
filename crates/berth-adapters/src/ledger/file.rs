//! JSON-file port ledger shared by every berth process of a user.
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     { "project": "shop", "service": "app", "internal_port": 80,
//!       "host_port": 10000, "allocated_at": "2026-01-01T12:00:00Z" }
//!   ]
//! }
//! ```
//!
//! Mutations take `<ledger>.lock`, re-read the file, apply the change to a
//! [`PortTable`] and atomically replace the file. Reads skip the lock: the
//! file on disk is always a complete version.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use berth_core::{
    application::{ApplicationError, ports::PortLedger},
    domain::{LedgerEntry, LedgerKey, PortTable, ReserveOutcome},
    error::{BerthError, BerthResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::persist::{LockError, LockGuard, atomic_write, lock_path_for};

const FORMAT_VERSION: u32 = 1;

/// How long a mutation waits for another process to release the ledger.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(3000);

/// `~/.berth/ports.json`
pub fn default_ledger_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".berth").join("ports.json"))
        .unwrap_or_else(|| PathBuf::from(".berth").join("ports.json"))
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    #[serde(default)]
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    project: String,
    service: String,
    internal_port: u16,
    host_port: u16,
    allocated_at: DateTime<Utc>,
}

/// Table plus the allocation time of each key.
#[derive(Debug, Default)]
struct Snapshot {
    table: PortTable,
    allocated_at: BTreeMap<LedgerKey, DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FilePortLedger {
    path: PathBuf,
    lock_timeout: Duration,
}

impl FilePortLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocation timestamps for `ports list`.
    pub fn allocated_at(&self) -> BerthResult<BTreeMap<LedgerKey, DateTime<Utc>>> {
        Ok(self.read()?.allocated_at)
    }

    fn read(&self) -> BerthResult<Snapshot> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(e) => return Err(self.io_error(&e)),
        };
        if raw.trim().is_empty() {
            return Ok(Snapshot::default());
        }

        let file: LedgerFile =
            serde_json::from_str(&raw).map_err(|e| self.corrupted(e.to_string()))?;
        if file.version != FORMAT_VERSION {
            return Err(self.corrupted(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                file.version
            )));
        }

        let mut allocated_at = BTreeMap::new();
        let entries: Vec<LedgerEntry> = file
            .entries
            .into_iter()
            .map(|stored| {
                let key = LedgerKey::new(stored.project, stored.service, stored.internal_port);
                allocated_at.insert(key.clone(), stored.allocated_at);
                LedgerEntry {
                    key,
                    host_port: stored.host_port,
                }
            })
            .collect();

        let table = PortTable::from_entries(entries).map_err(|e| self.corrupted(e.to_string()))?;
        Ok(Snapshot {
            table,
            allocated_at,
        })
    }

    fn write(&self, snapshot: &Snapshot) -> BerthResult<()> {
        let now = Utc::now();
        let file = LedgerFile {
            version: FORMAT_VERSION,
            entries: snapshot
                .table
                .entries()
                .into_iter()
                .map(|entry| StoredEntry {
                    allocated_at: snapshot
                        .allocated_at
                        .get(&entry.key)
                        .copied()
                        .unwrap_or(now),
                    project: entry.key.project,
                    service: entry.key.service,
                    internal_port: entry.key.internal_port,
                    host_port: entry.host_port,
                })
                .collect(),
        };

        let mut json = serde_json::to_string_pretty(&file).map_err(|e| BerthError::Internal {
            message: format!("serializing port ledger: {e}"),
        })?;
        json.push('\n');
        atomic_write(&self.path, json.as_bytes()).map_err(|e| self.io_error(&e))
    }

    /// One locked read-modify-write cycle. `f` returns its result and
    /// whether the table changed; unchanged tables are not rewritten.
    fn mutate<T>(&self, f: impl FnOnce(&mut PortTable) -> (T, bool)) -> BerthResult<T> {
        let _guard = self.lock()?;
        let mut snapshot = self.read()?;
        let (out, changed) = f(&mut snapshot.table);
        if changed {
            self.write(&snapshot)?;
        }
        Ok(out)
    }

    fn lock(&self) -> BerthResult<LockGuard> {
        LockGuard::acquire(&lock_path_for(&self.path), self.lock_timeout).map_err(|e| match e {
            LockError::TimedOut { waited, .. } => ApplicationError::LedgerBusy {
                path: self.path.clone(),
                waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            }
            .into(),
            LockError::Io { source, .. } => self.io_error(&source),
        })
    }

    fn io_error(&self, e: &io::Error) -> BerthError {
        ApplicationError::LedgerIo {
            path: self.path.clone(),
            reason: e.to_string(),
        }
        .into()
    }

    fn corrupted(&self, reason: String) -> BerthError {
        ApplicationError::LedgerCorrupted {
            path: self.path.clone(),
            reason,
        }
        .into()
    }
}

impl PortLedger for FilePortLedger {
    fn get(&self, key: &LedgerKey) -> BerthResult<Option<u16>> {
        Ok(self.read()?.table.get(key))
    }

    #[instrument(skip(self), fields(key = %key))]
    fn reserve(&self, key: &LedgerKey, host_port: u16) -> BerthResult<ReserveOutcome> {
        self.mutate(|table| {
            let before = table.get(key);
            let outcome = table.reserve(key.clone(), host_port);
            let changed = outcome == ReserveOutcome::Reserved && before != Some(host_port);
            debug!(?outcome, changed, "reserve");
            (outcome, changed)
        })
    }

    fn release(&self, keys: &[LedgerKey]) -> BerthResult<usize> {
        self.mutate(|table| {
            let released = keys.iter().filter_map(|k| table.release(k)).count();
            (released, released > 0)
        })
    }

    #[instrument(skip(self))]
    fn release_project(&self, project: &str) -> BerthResult<usize> {
        self.mutate(|table| {
            let released = table.release_project(project);
            (released, released > 0)
        })
    }

    fn live_host_ports(&self) -> BerthResult<BTreeSet<u16>> {
        Ok(self.read()?.table.live_host_ports())
    }

    fn entries(&self) -> BerthResult<Vec<LedgerEntry>> {
        Ok(self.read()?.table.entries())
    }
}
