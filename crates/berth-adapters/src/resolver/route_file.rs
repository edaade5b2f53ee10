//! JSON route table consumed by a local reverse proxy or DNS shim.
//!
//! ```json
//! { "routes": { "app.shop.localhost": 10000, "db.shop.localhost": 10001 } }
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use berth_core::{
    application::{ApplicationError, ports::NameResolver},
    domain::{DEFAULT_DOMAIN_SUFFIX, endpoints::hostname},
    error::{BerthError, BerthResult},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ledger::DEFAULT_LOCK_TIMEOUT;
use crate::persist::{LockGuard, atomic_write, lock_path_for};

/// `~/.berth/routes.json`
pub fn default_routes_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".berth").join("routes.json"))
        .unwrap_or_else(|| PathBuf::from(".berth").join("routes.json"))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RouteTable {
    #[serde(default)]
    routes: BTreeMap<String, u16>,
}

#[derive(Debug, Clone)]
pub struct RouteFileResolver {
    path: PathBuf,
    domain_suffix: String,
    lock_timeout: Duration,
}

impl RouteFileResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            domain_suffix: DEFAULT_DOMAIN_SUFFIX.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_domain_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.domain_suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current hostname → port table.
    pub fn routes(&self) -> BerthResult<BTreeMap<String, u16>> {
        Ok(self.read()?.routes)
    }

    fn read(&self) -> BerthResult<RouteTable> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(RouteTable::default()),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| failed(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(RouteTable::default()),
            Err(e) => Err(failed(format!("{}: {e}", self.path.display()))),
        }
    }
}

fn failed(reason: String) -> BerthError {
    ApplicationError::PublishFailed { reason }.into()
}

impl RouteFileResolver {
    /// Under the table lock: drop every `<service>.<project>.<suffix>` host,
    /// then insert `services`.
    fn replace_project(&self, project: &str, services: &BTreeMap<String, u16>) -> BerthResult<()> {
        let _guard = LockGuard::acquire(&lock_path_for(&self.path), self.lock_timeout)
            .map_err(|e| failed(e.to_string()))?;

        let mut table = self.read()?;
        let tail = hostname(project, "", &self.domain_suffix);
        let before = table.routes.len();
        table.routes.retain(|host, _| !host.ends_with(&tail));
        let dropped = before - table.routes.len();

        if services.is_empty() && dropped == 0 {
            return Ok(());
        }
        for (service, port) in services {
            table
                .routes
                .insert(hostname(project, service, &self.domain_suffix), *port);
        }

        let mut json = serde_json::to_string_pretty(&table).map_err(|e| failed(e.to_string()))?;
        json.push('\n');
        atomic_write(&self.path, json.as_bytes())
            .map_err(|e| failed(format!("{}: {e}", self.path.display())))?;
        debug!(dropped, added = services.len(), "routes replaced");
        Ok(())
    }
}

impl NameResolver for RouteFileResolver {
    #[instrument(skip(self, services), fields(routes = %self.path.display()))]
    fn add_project(&self, project: &str, services: &BTreeMap<String, u16>) -> BerthResult<()> {
        self.replace_project(project, services)
    }

    #[instrument(skip(self), fields(routes = %self.path.display()))]
    fn remove_project(&self, project: &str) -> BerthResult<()> {
        self.replace_project(project, &BTreeMap::new())
    }
}
