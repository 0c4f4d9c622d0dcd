//! The Registry: idempotent get-or-create over identity keys.
//!
//! The registry canonicalizes metadata, then lets the store's uniqueness
//! constraint decide which of any concurrent callers creates the record.
//! There is no lock here: callers in separate processes sharing one
//! database get the same guarantee as tasks in one process.

use std::sync::Arc;

use idreg_core::{normalize, IdentityKey, Metadata, PendingRecord, PublicId, RegistryRecord};
use idreg_store::{InsertResult, Store};

use crate::error::{RegistryError, Result};
use crate::request::RegisterRequest;

/// The main Registry struct.
///
/// Cheap to clone; clones share the same store handle.
pub struct Registry<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> Registry<S> {
    /// Create a registry over an initialized store.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a registry over a store that is already shared.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the record for `(namespace, entity_type, metadata)`, creating
    /// it if this is the first time the key has been seen.
    ///
    /// Every caller presenting the same key gets the same record, however
    /// many race for it. The caller must pass a non-empty namespace and
    /// entity type; [`RegisterRequest`] enforces that at the boundary.
    pub async fn get_or_create(
        &self,
        namespace: &str,
        entity_type: &str,
        metadata: &Metadata,
    ) -> Result<RegistryRecord> {
        let normalized = normalize(metadata)?;
        let key = IdentityKey::new(namespace, entity_type, normalized.fingerprint());

        if let Some(existing) = self.store.find_by_key(&key).await? {
            tracing::debug!(
                namespace,
                entity_type,
                identifier = %existing.identifier,
                "identity key already registered"
            );
            return Ok(existing);
        }

        let pending = PendingRecord::new(key, normalized);

        match self.store.insert_record(&pending).await? {
            InsertResult::Inserted(record) => {
                tracing::info!(
                    namespace,
                    entity_type,
                    identifier = %record.identifier,
                    fingerprint = %record.fingerprint.digest_hex(),
                    "issued new identifier"
                );
                Ok(record)
            }
            InsertResult::AlreadyExists => {
                tracing::debug!(
                    namespace,
                    entity_type,
                    discarded = %pending.identifier,
                    "lost insert race, adopting existing record"
                );
                self.adopt_winner(&pending.key).await
            }
        }
    }

    /// Get-or-create for a validated boundary request.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegistryRecord> {
        self.get_or_create(request.namespace(), request.entity_type(), request.metadata())
            .await
    }

    /// Look up a record by its public identifier.
    pub async fn lookup(&self, identifier: &PublicId) -> Result<Option<RegistryRecord>> {
        Ok(self.store.find_by_identifier(identifier).await?)
    }

    /// Re-read the key after a rejected insert. Runs once; a miss is fatal.
    async fn adopt_winner(&self, key: &IdentityKey) -> Result<RegistryRecord> {
        match self.store.find_by_key(key).await? {
            Some(record) => Ok(record),
            None => {
                tracing::error!(
                    namespace = %key.namespace,
                    entity_type = %key.entity_type,
                    fingerprint = %key.fingerprint.digest_hex(),
                    "duplicate insert rejected but no record found"
                );
                Err(RegistryError::InvariantViolation {
                    namespace: key.namespace.clone(),
                    entity_type: key.entity_type.clone(),
                    fingerprint_digest: key.fingerprint.digest_hex(),
                })
            }
        }
    }
}
