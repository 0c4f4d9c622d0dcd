//! Error types for the registry core.

use thiserror::Error;

/// Errors raised while canonicalizing metadata or parsing core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A metadata value has no canonical string form (arrays and objects).
    #[error("metadata value for key {key:?} is a {kind}, expected a scalar")]
    InvalidMetadataValue { key: String, kind: &'static str },

    /// Stored fingerprint text could not be decoded back into metadata.
    #[error("malformed fingerprint: {0}")]
    MalformedFingerprint(String),

    /// Text that does not parse as a public identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Timestamp text that is not RFC 3339 UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
