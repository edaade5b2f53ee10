//! Port ledger adapters.

mod file;
mod memory;

pub use file::{DEFAULT_LOCK_TIMEOUT, FilePortLedger, default_ledger_path};
pub use memory::InMemoryPortLedger;
