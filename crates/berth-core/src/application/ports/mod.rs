//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `berth-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `ManifestLoader`: Read and validate `berth.yaml`
//!   - `PortLedger`: The shared host-port table
//!   - `PortProbe`: Ask the OS whether a port is in use
//!   - `ComposeWriter`: Persist the synthesized descriptor
//!   - `NameResolver`: Advertise service hostnames locally
//!   - `Filesystem`: Plain file output (access summary)
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{ComposeWriter, Filesystem, ManifestLoader, NameResolver, PortLedger, PortProbe};

#[cfg(test)]
pub use output::{
    MockComposeWriter, MockFilesystem, MockManifestLoader, MockNameResolver, MockPortLedger,
    MockPortProbe,
};
