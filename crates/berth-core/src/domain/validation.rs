use crate::domain::{
    entities::Manifest,
    error::DomainError,
};

/// Centralized domain validation.
///
/// Entities carry their own rules; this is the one door callers go through.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_manifest(manifest: &Manifest) -> Result<(), DomainError> {
        manifest.validate()
    }
}
