//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "generate a compose file" or "release a
//! project's ports".

pub mod endpoint_publisher;
pub mod generate_service;
pub mod port_allocator;

pub use endpoint_publisher::{DEFAULT_SUMMARY_FILE, EndpointPublisher, PublishReport, StepOutcome};
pub use generate_service::{DEFAULT_COMPOSE_FILE, GenerateReport, GenerateRequest, GenerateService};
pub use port_allocator::{DEFAULT_BASE_PORT, DEFAULT_MAX_SCAN, PortAllocator};
