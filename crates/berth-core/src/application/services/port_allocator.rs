//! Port Allocator - the only writer of the port ledger.
//!
//! For each `(service, internal_port)` of a project, in service-then-port
//! order:
//! 1. Reuse the live ledger entry if there is one
//! 2. Otherwise scan upward from `base`, skipping ports the ledger already
//!    holds and ports another process is bound to
//! 3. Reserve the candidate; on a conflict with a concurrent invocation,
//!    move to the next candidate
//!
//! Any failure releases the reservations made by that call before the
//! error is returned.

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{PortLedger, PortProbe},
    },
    domain::{LedgerEntry, LedgerKey, PortRequest, ProjectName, ReserveOutcome, ResolvedPortMap},
    error::BerthResult,
};

use std::collections::BTreeSet;

/// First host port tried for fresh allocations.
pub const DEFAULT_BASE_PORT: u16 = 10000;

/// How many candidates are tried per pair before giving up.
pub const DEFAULT_MAX_SCAN: u32 = 5000;

pub struct PortAllocator {
    ledger: Box<dyn PortLedger>,
    probe: Box<dyn PortProbe>,
    base: u16,
    max_scan: u32,
}

impl PortAllocator {
    pub fn new(ledger: Box<dyn PortLedger>, probe: Box<dyn PortProbe>) -> Self {
        Self {
            ledger,
            probe,
            base: DEFAULT_BASE_PORT,
            max_scan: DEFAULT_MAX_SCAN,
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: u16) -> Self {
        self.base = base.max(1);
        self
    }

    #[must_use]
    pub fn with_max_scan(mut self, max_scan: u32) -> Self {
        self.max_scan = max_scan;
        self
    }

    /// Resolve a host port for every requested pair of `project`.
    ///
    /// Unchanged inputs reproduce the previous assignment exactly.
    #[instrument(skip_all, fields(project = %project, requested = request.len()))]
    pub fn allocate_ports_for_project(
        &self,
        project: &ProjectName,
        request: &PortRequest,
    ) -> BerthResult<ResolvedPortMap> {
        let mut taken = self.ledger.live_host_ports()?;
        let mut fresh: Vec<LedgerKey> = Vec::new();
        let mut resolved = ResolvedPortMap::new();

        for (service, internal_port) in request.pairs() {
            let key = LedgerKey::new(project.as_str(), service, internal_port);
            match self.resolve(&key, &mut taken) {
                Ok(Resolution::Reused(host)) => {
                    debug!(%key, host, "reusing ledger entry");
                    resolved.insert(service, internal_port, host);
                }
                Ok(Resolution::Reserved(host)) => {
                    debug!(%key, host, "reserved host port");
                    fresh.push(key);
                    resolved.insert(service, internal_port, host);
                }
                Err(e) => {
                    self.rollback(&fresh);
                    return Err(e);
                }
            }
        }

        info!(
            ports = resolved.len(),
            new = fresh.len(),
            "Allocated ports: {resolved}"
        );
        Ok(resolved)
    }

    /// Release every entry of `project`. Returns how many were held.
    #[instrument(skip(self))]
    pub fn release_project(&self, project: &str) -> BerthResult<usize> {
        let released = self.ledger.release_project(project)?;
        info!(released, "Released project ports");
        Ok(released)
    }

    /// Release entries of `project` that `request` no longer asks for.
    #[instrument(skip_all, fields(project = %project))]
    pub fn prune_stale(&self, project: &ProjectName, request: &PortRequest) -> BerthResult<usize> {
        let stale: Vec<LedgerKey> = self
            .ledger
            .entries()?
            .into_iter()
            .map(|entry| entry.key)
            .filter(|key| {
                key.project == project.as_str()
                    && !request.contains(&key.service, key.internal_port)
            })
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        let released = self.ledger.release(&stale)?;
        info!(released, "Pruned ports no longer declared");
        Ok(released)
    }

    /// Ledger entries, optionally restricted to one project.
    pub fn assignments(&self, project: Option<&str>) -> BerthResult<Vec<LedgerEntry>> {
        let entries = self.ledger.entries()?;
        Ok(match project {
            Some(p) => entries.into_iter().filter(|e| e.key.project == p).collect(),
            None => entries,
        })
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn resolve(&self, key: &LedgerKey, taken: &mut BTreeSet<u16>) -> BerthResult<Resolution> {
        if let Some(host) = self.ledger.get(key)? {
            taken.insert(host);
            return Ok(Resolution::Reused(host));
        }

        let start = u32::from(self.base);
        let end = start.saturating_add(self.max_scan).min(u32::from(u16::MAX) + 1);

        for candidate in start..end {
            // `end` never exceeds 65536, so this always fits.
            let Ok(port) = u16::try_from(candidate) else {
                break;
            };
            if taken.contains(&port) {
                continue;
            }
            if self.probe.is_bound(port) {
                debug!(port, "skipping port bound on host");
                continue;
            }
            match self.ledger.reserve(key, port)? {
                ReserveOutcome::Reserved => {
                    taken.insert(port);
                    return Ok(Resolution::Reserved(port));
                }
                ReserveOutcome::Conflict { holder } => {
                    debug!(port, %holder, "lost reservation race, trying next port");
                    taken.insert(port);
                }
            }
        }

        Err(ApplicationError::PortSpaceExhausted {
            project: key.project.clone(),
            service: key.service.clone(),
            internal_port: key.internal_port,
            scanned: end.saturating_sub(start),
        }
        .into())
    }

    fn rollback(&self, fresh: &[LedgerKey]) {
        if fresh.is_empty() {
            return;
        }
        match self.ledger.release(fresh) {
            Ok(released) => info!(released, "Rolled back partial allocation"),
            Err(e) => warn!(
                error = %e,
                keys = fresh.len(),
                "Rollback of partial allocation failed"
            ),
        }
    }
}

enum Resolution {
    Reused(u16),
    Reserved(u16),
}
