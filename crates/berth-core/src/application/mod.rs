//! Application layer for berth.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (GenerateService, PortAllocator,
//!   EndpointPublisher)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! Services sequence I/O through the ports and leave every rule about
//! manifests, reservations and compose output to `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    DEFAULT_BASE_PORT, DEFAULT_COMPOSE_FILE, DEFAULT_MAX_SCAN, DEFAULT_SUMMARY_FILE,
    EndpointPublisher, GenerateReport, GenerateRequest, GenerateService, PortAllocator,
    PublishReport, StepOutcome,
};

pub use ports::{ComposeWriter, Filesystem, ManifestLoader, NameResolver, PortLedger, PortProbe};

pub use error::ApplicationError;
