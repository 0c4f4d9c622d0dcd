//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use idreg_core::{IdentityKey, PendingRecord, PublicId, RegistryRecord};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; the
/// key check and the insert happen under one write lock, which plays the
/// part of the uniqueness constraint.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records in insertion order; `records[i].id == i + 1`.
    records: Vec<RegistryRecord>,

    /// Identity key index: key -> position in `records`.
    by_key: HashMap<IdentityKey, usize>,

    /// Public identifier index.
    by_identifier: HashMap<PublicId, usize>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<RegistryRecord>> {
        let inner = self.read()?;
        Ok(inner.by_key.get(key).map(|&pos| inner.records[pos].clone()))
    }

    async fn insert_record(&self, record: &PendingRecord) -> Result<InsertResult> {
        let mut inner = self.write()?;

        if inner.by_key.contains_key(&record.key) {
            return Ok(InsertResult::AlreadyExists);
        }

        let pos = inner.records.len();
        let stored = record.clone().into_record(pos as i64 + 1);
        inner.by_key.insert(record.key.clone(), pos);
        inner.by_identifier.insert(record.identifier, pos);
        inner.records.push(stored.clone());

        Ok(InsertResult::Inserted(stored))
    }

    async fn find_by_identifier(&self, identifier: &PublicId) -> Result<Option<RegistryRecord>> {
        let inner = self.read()?;
        Ok(inner
            .by_identifier
            .get(identifier)
            .map(|&pos| inner.records[pos].clone()))
    }

    async fn count_records(&self, namespace: Option<&str>) -> Result<u64> {
        let inner = self.read()?;
        let count = match namespace {
            Some(ns) => inner.records.iter().filter(|r| r.namespace == ns).count(),
            None => inner.records.len(),
        };
        Ok(count as u64)
    }
}
