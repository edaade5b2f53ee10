pub mod compose;
pub mod ledger;
pub mod manifest;
pub mod ports;

pub use crate::domain::DomainError;
pub use compose::{ComposeBuild, ComposeDescriptor, ComposeNetwork, ComposeService, ComposeVolume};
pub use ledger::{LedgerEntry, LedgerKey, PortTable, ReserveOutcome};
pub use manifest::{
    BuildKind, Command, Manifest, ManifestDocument, NetworkSpec, ServiceSpec, VolumeSpec,
};
pub use ports::{PortRequest, PortSpec, ResolvedPortMap};
