//! In-memory model of the machine-wide port ledger.
//!
//! [`PortTable`] owns the two ledger invariants so every adapter gets them
//! for free:
//!
//! - a `(project, service, internal_port)` key maps to at most one host port
//! - a host port is held by at most one key
//!
//! Adapters decide how the table is stored and locked; the table decides
//! what a valid reservation is.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::error::DomainError;

/// Identity of one reserved port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedgerKey {
    pub project: String,
    pub service: String,
    pub internal_port: u16,
}

impl LedgerKey {
    pub fn new(project: impl Into<String>, service: impl Into<String>, internal_port: u16) -> Self {
        Self {
            project: project.into(),
            service: service.into(),
            internal_port,
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.project, self.service, self.internal_port)
    }
}

/// A key and the host port it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: LedgerKey,
    pub host_port: u16,
}

/// Result of [`PortTable::reserve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The key now holds the port. Also returned when it already did.
    Reserved,
    /// Another key holds the port; nothing changed.
    Conflict { holder: LedgerKey },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortTable {
    by_key: BTreeMap<LedgerKey, u16>,
    by_port: BTreeMap<u16, LedgerKey>,
}

impl PortTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from stored entries, rejecting anything that breaks
    /// the two invariants.
    pub fn from_entries(
        entries: impl IntoIterator<Item = LedgerEntry>,
    ) -> Result<Self, DomainError> {
        let mut table = Self::new();
        for LedgerEntry { key, host_port } in entries {
            if table.by_key.contains_key(&key) {
                return Err(DomainError::DuplicateLedgerKey {
                    key: key.to_string(),
                });
            }
            if let Some(first) = table.by_port.get(&host_port) {
                return Err(DomainError::DuplicateHostPort {
                    host_port,
                    first: first.to_string(),
                    second: key.to_string(),
                });
            }
            table.by_port.insert(host_port, key.clone());
            table.by_key.insert(key, host_port);
        }
        Ok(table)
    }

    pub fn get(&self, key: &LedgerKey) -> Option<u16> {
        self.by_key.get(key).copied()
    }

    pub fn holder_of(&self, host_port: u16) -> Option<&LedgerKey> {
        self.by_port.get(&host_port)
    }

    /// Bind `key` to `host_port` unless another key already holds it.
    ///
    /// A key that held a different port gives that port up.
    pub fn reserve(&mut self, key: LedgerKey, host_port: u16) -> ReserveOutcome {
        match self.by_port.get(&host_port) {
            Some(holder) if *holder == key => return ReserveOutcome::Reserved,
            Some(holder) => {
                return ReserveOutcome::Conflict {
                    holder: holder.clone(),
                };
            }
            None => {}
        }

        if let Some(previous) = self.by_key.insert(key.clone(), host_port) {
            self.by_port.remove(&previous);
        }
        self.by_port.insert(host_port, key);
        ReserveOutcome::Reserved
    }

    /// Drop a reservation. Returns the port it held, if any.
    pub fn release(&mut self, key: &LedgerKey) -> Option<u16> {
        let port = self.by_key.remove(key)?;
        self.by_port.remove(&port);
        Some(port)
    }

    /// Drop every reservation of `project`. Returns how many were removed.
    pub fn release_project(&mut self, project: &str) -> usize {
        let keys: Vec<LedgerKey> = self
            .by_key
            .keys()
            .filter(|k| k.project == project)
            .cloned()
            .collect();
        for key in &keys {
            self.release(key);
        }
        keys.len()
    }

    /// Every host port currently held.
    pub fn live_host_ports(&self) -> BTreeSet<u16> {
        self.by_port.keys().copied().collect()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.by_key
            .iter()
            .map(|(key, port)| LedgerEntry {
                key: key.clone(),
                host_port: *port,
            })
            .collect()
    }

    pub fn project_entries(&self, project: &str) -> Vec<LedgerEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.key.project == project)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
