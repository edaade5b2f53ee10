// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for berth.
//!
//! Pure types and transformations. Reading manifests, persisting the port
//! ledger and probing sockets happen behind the ports defined in the
//! application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Immutable inputs**: A loaded `Manifest` is never mutated
//! - **Invariants in types**: `PortTable` alone decides what a valid
//!   reservation is
//!
// Public API - what the world sees
pub mod endpoints;
pub mod entities;
pub mod error;
pub mod synthesis;
pub mod value_objects;

mod validation;

pub use endpoints::{
    DEFAULT_DOMAIN_SUFFIX, Endpoint, PRIMARY_PORT_PREFERENCE, derive_endpoints, primary_port,
    render_access_summary,
};
pub use entities::{
    BuildKind, Command, ComposeBuild, ComposeDescriptor, ComposeNetwork, ComposeService,
    ComposeVolume, LedgerEntry, LedgerKey, Manifest, ManifestDocument, NetworkSpec, PortRequest,
    PortSpec, PortTable, ReserveOutcome, ResolvedPortMap, ServiceSpec, VolumeSpec,
};
pub use error::{DomainError, ErrorCategory};
pub use synthesis::{ComposeSynthesizer, DEFAULT_COMPOSE_VERSION};
pub use validation::DomainValidator;
pub use value_objects::{ProjectName, Protocol};
