//! Error types for the Registry.

use idreg_core::CoreError;
use idreg_store::StoreError;
use thiserror::Error;

use crate::request::RequestError;

/// Errors that can occur during Registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Metadata could not be canonicalized. No record was created.
    #[error("invalid metadata value: {0}")]
    InvalidMetadataValue(#[from] CoreError),

    /// The store failed during lookup or insert. Retrying the whole call is
    /// safe because get-or-create is idempotent.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// The store rejected an insert as a duplicate but then had no record
    /// for the key. Indicates a storage-layer bug.
    #[error(
        "registry invariant violated: insert for {namespace}/{entity_type} \
         (fingerprint {fingerprint_digest}) was rejected as a duplicate but no record exists"
    )]
    InvariantViolation {
        namespace: String,
        entity_type: String,
        fingerprint_digest: String,
    },

    /// The inbound request failed validation.
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),
}

impl RegistryError {
    /// Whether the caller may simply retry the same call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::StorageUnavailable(_))
    }
}

/// Result type for Registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
