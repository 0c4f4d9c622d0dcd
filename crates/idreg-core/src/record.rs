//! Registry records: the persisted mapping from identity key to identifier.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::{CoreError, Result};
use crate::metadata::NormalizedMetadata;
use crate::types::{Fingerprint, IdentityKey, PublicId};

/// A stored registry record.
///
/// Records are append-only: nothing in the workspace mutates one after the
/// store has assigned its `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    /// Storage sequence number. Internal, never handed to callers.
    pub id: i64,
    pub identifier: PublicId,
    pub namespace: String,
    pub entity_type: String,
    pub fingerprint: Fingerprint,
    pub metadata: NormalizedMetadata,
    pub created_at: DateTime<Utc>,
}

impl RegistryRecord {
    /// The identity key this record was created under.
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(
            self.namespace.clone(),
            self.entity_type.clone(),
            self.fingerprint.clone(),
        )
    }

    /// Creation time as ISO-8601 UTC with a `Z` suffix.
    pub fn created(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

/// A record that has not been stored yet.
///
/// Carries everything except the sequence number. Losing an insert race
/// simply drops the pending record and its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub identifier: PublicId,
    pub key: IdentityKey,
    pub metadata: NormalizedMetadata,
    pub created_at: DateTime<Utc>,
}

impl PendingRecord {
    /// Build a candidate record with a fresh identifier stamped now.
    pub fn new(key: IdentityKey, metadata: NormalizedMetadata) -> Self {
        Self {
            identifier: PublicId::generate(),
            key,
            metadata,
            created_at: now_micros(),
        }
    }

    /// Attach the storage-assigned sequence number.
    pub fn into_record(self, id: i64) -> RegistryRecord {
        RegistryRecord {
            id,
            identifier: self.identifier,
            namespace: self.key.namespace,
            entity_type: self.key.entity_type,
            fingerprint: self.key.fingerprint,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

/// Current time truncated to the precision timestamps are stored with.
///
/// Truncating up front keeps a freshly inserted record equal to the same
/// record read back later.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp written by [`format_timestamp`] (any RFC 3339 form is accepted).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::InvalidTimestamp(format!("{s:?}: {e}")))
}
