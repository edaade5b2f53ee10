use std::collections::BTreeMap;

use berth_core::{application::ports::NameResolver, error::BerthResult};
use tracing::debug;

/// Resolver used when publishing is disabled; accepts and drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl NameResolver for NullResolver {
    fn add_project(&self, project: &str, services: &BTreeMap<String, u16>) -> BerthResult<()> {
        debug!(project, count = services.len(), "name resolution disabled");
        Ok(())
    }

    fn remove_project(&self, project: &str) -> BerthResult<()> {
        debug!(project, "name resolution disabled");
        Ok(())
    }
}
