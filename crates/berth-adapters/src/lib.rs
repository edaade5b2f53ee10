//! Infrastructure adapters for berth.
//!
//! This crate implements the ports defined in `berth_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod compose_writer;
pub mod filesystem;
pub mod ledger;
pub mod manifest_loader;
pub mod persist;
pub mod probe;
pub mod resolver;

// Re-export commonly used adapters
pub use compose_writer::{GENERATED_HEADER, YamlComposeWriter};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use ledger::{FilePortLedger, InMemoryPortLedger, default_ledger_path};
pub use manifest_loader::{MANIFEST_FILE_NAMES, YamlManifestLoader};
pub use probe::{NoProbe, TcpPortProbe};
pub use resolver::{NullResolver, RouteFileResolver, default_routes_path};
