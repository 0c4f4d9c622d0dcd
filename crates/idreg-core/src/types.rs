//! Strong type definitions for the registry.
//!
//! Identifiers and keys are newtypes so a fingerprint can never be passed
//! where a namespace is expected.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// The public identifier handed to callers: 128 random bits in UUID v4 layout.
///
/// Distinct from the storage sequence number, which never leaves the store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(Uuid);

impl PublicId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicId({})", self.0.hyphenated())
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for PublicId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidIdentifier(format!("{s:?}: {e}")))
    }
}

/// Canonical text encoding of a normalized metadata mapping.
///
/// Produced by [`crate::NormalizedMetadata::fingerprint`]; equal mappings
/// always yield byte-identical fingerprints.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap fingerprint text read back from storage.
    ///
    /// The text is not re-validated here; decoding happens in
    /// [`crate::NormalizedMetadata::from_fingerprint`].
    pub fn from_stored(text: String) -> Self {
        Self(text)
    }

    pub(crate) fn from_canonical(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short Blake3 digest of the fingerprint, for log fields.
    pub fn digest_hex(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        hex::encode(&hash.as_bytes()[..8])
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.digest_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The uniqueness key of a registry record.
///
/// Two keys are equal iff namespace, entity type and fingerprint all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub namespace: String,
    pub entity_type: String,
    pub fingerprint: Fingerprint,
}

impl IdentityKey {
    pub fn new(
        namespace: impl Into<String>,
        entity_type: impl Into<String>,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            entity_type: entity_type.into(),
            fingerprint,
        }
    }
}
