//! Store trait: the abstract interface for registry persistence.
//!
//! This trait keeps the registry storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use idreg_core::{IdentityKey, PendingRecord, PublicId, RegistryRecord};

use crate::error::Result;

/// Result of inserting a pending record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// The record was committed; carries it with its assigned sequence number.
    Inserted(RegistryRecord),
    /// A record with the same identity key already exists. Nothing was written.
    AlreadyExists,
}

/// The Store trait: async interface for registry persistence.
///
/// # Design Notes
///
/// - **Storage arbitrates races**: `insert_record` must reject a duplicate
///   identity key atomically (a uniqueness constraint, not a caller lock).
///   Of any number of concurrent inserts for one key, exactly one returns
///   `Inserted`.
/// - **Commit or nothing**: `Inserted` is only returned after the write is
///   durable. A failed or interrupted insert leaves no record.
/// - **Append-only**: there is no update or delete.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up the record for an identity key.
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<RegistryRecord>>;

    /// Insert a pending record, guarded by the identity key uniqueness constraint.
    async fn insert_record(&self, record: &PendingRecord) -> Result<InsertResult>;

    /// Look up a record by its public identifier.
    async fn find_by_identifier(&self, identifier: &PublicId) -> Result<Option<RegistryRecord>>;

    /// Count stored records, optionally within one namespace.
    async fn count_records(&self, namespace: Option<&str>) -> Result<u64>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<RegistryRecord>> {
        (**self).find_by_key(key).await
    }

    async fn insert_record(&self, record: &PendingRecord) -> Result<InsertResult> {
        (**self).insert_record(record).await
    }

    async fn find_by_identifier(&self, identifier: &PublicId) -> Result<Option<RegistryRecord>> {
        (**self).find_by_identifier(identifier).await
    }

    async fn count_records(&self, namespace: Option<&str>) -> Result<u64> {
        (**self).count_records(namespace).await
    }
}
