//! In-memory port ledger for tests and dry runs.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use berth_core::{
    application::ports::PortLedger,
    domain::{LedgerEntry, LedgerKey, PortTable, ReserveOutcome},
    error::{BerthError, BerthResult},
};

/// Process-local ledger. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPortLedger {
    inner: Arc<RwLock<PortTable>>,
}

impl InMemoryPortLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing table (testing helper).
    pub fn with_table(table: PortTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    /// Copy of the current table (testing helper).
    pub fn snapshot(&self) -> BerthResult<PortTable> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> BerthResult<RwLockReadGuard<'_, PortTable>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> BerthResult<RwLockWriteGuard<'_, PortTable>> {
        self.inner.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> BerthError {
    BerthError::Internal {
        message: "in-memory port ledger lock poisoned".into(),
    }
}

impl PortLedger for InMemoryPortLedger {
    fn get(&self, key: &LedgerKey) -> BerthResult<Option<u16>> {
        Ok(self.read()?.get(key))
    }

    fn reserve(&self, key: &LedgerKey, host_port: u16) -> BerthResult<ReserveOutcome> {
        Ok(self.write()?.reserve(key.clone(), host_port))
    }

    fn release(&self, keys: &[LedgerKey]) -> BerthResult<usize> {
        let mut table = self.write()?;
        Ok(keys.iter().filter_map(|k| table.release(k)).count())
    }

    fn release_project(&self, project: &str) -> BerthResult<usize> {
        Ok(self.write()?.release_project(project))
    }

    fn live_host_ports(&self) -> BerthResult<BTreeSet<u16>> {
        Ok(self.read()?.live_host_ports())
    }

    fn entries(&self) -> BerthResult<Vec<LedgerEntry>> {
        Ok(self.read()?.entries())
    }
}
