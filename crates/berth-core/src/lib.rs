//! berth Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of berth: it turns
//! a project's `berth.yaml` into a docker compose file while assigning host
//! ports that never collide across projects on the same machine.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            berth-cli (CLI)              │
//! │      (Implements Driving Ports)         │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │          Application Services           │
//! │  (GenerateService, PortAllocator,       │
//! │   EndpointPublisher)                    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │  (ManifestLoader, PortLedger, Probe,    │
//! │   ComposeWriter, NameResolver)          │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     berth-adapters (Infrastructure)     │
//! │  (FilePortLedger, YamlComposeWriter..)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │  (Manifest, PortTable, Synthesizer)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use berth_core::{
//!     application::{GenerateRequest, GenerateService, PortAllocator},
//!     domain::ComposeSynthesizer,
//! };
//!
//! # fn adapters() -> (
//! #     Box<dyn berth_core::application::ManifestLoader>,
//! #     Box<dyn berth_core::application::PortLedger>,
//! #     Box<dyn berth_core::application::PortProbe>,
//! #     Box<dyn berth_core::application::ComposeWriter>,
//! # ) { unimplemented!() }
//! let (loader, ledger, probe, writer) = adapters();
//! let service = GenerateService::new(
//!     loader,
//!     PortAllocator::new(ledger, probe),
//!     ComposeSynthesizer::default(),
//!     writer,
//! );
//! let report = service.generate(&GenerateRequest::new("./shop")).unwrap();
//! println!("{}", report.ports);
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        EndpointPublisher, GenerateReport, GenerateRequest, GenerateService, PortAllocator,
        PublishReport, StepOutcome,
        ports::{ComposeWriter, Filesystem, ManifestLoader, NameResolver, PortLedger, PortProbe},
    };
    pub use crate::domain::{
        ComposeDescriptor, ComposeSynthesizer, LedgerEntry, LedgerKey, Manifest, PortRequest,
        PortTable, ProjectName, ReserveOutcome, ResolvedPortMap,
    };
    pub use crate::error::{BerthError, BerthResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
