//! Registry behavior over real stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use idreg::core::PendingRecord;
use idreg::store::{InsertResult, MemoryStore, SqliteConfig, SqliteStore, Store, StoreError};
use idreg::{
    IdentifierResponse, IdentityKey, Metadata, PublicId, RegisterRequest, Registry,
    RegistryError, RegistryRecord,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn acme() -> Metadata {
    Metadata::new().with("name", "Acme").with("region", "EU")
}

#[tokio::test]
async fn test_same_arguments_return_same_record() {
    init_tracing();
    let registry = Registry::new(SqliteStore::open_memory().unwrap());

    let first = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();
    let second = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.created(), second.created());
    assert_eq!(registry.store().count_records(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_key_order_is_irrelevant() {
    let registry = Registry::new(MemoryStore::new());

    let forward = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();
    let reversed = Metadata::new().with("region", "EU").with("name", "Acme");
    let backward = registry
        .get_or_create("orders", "customer", &reversed)
        .await
        .unwrap();

    assert_eq!(forward.identifier, backward.identifier);
    assert_eq!(forward.fingerprint, backward.fingerprint);
}

#[tokio::test]
async fn test_different_metadata_gets_different_identifier() {
    let registry = Registry::new(SqliteStore::open_memory().unwrap());

    let one = Metadata::new().with("a", "1");
    let two = Metadata::new().with("a", "2");
    let r1 = registry
        .get_or_create("orders", "customer", &one)
        .await
        .unwrap();
    let r2 = registry
        .get_or_create("orders", "customer", &two)
        .await
        .unwrap();

    assert_ne!(r1.identifier, r2.identifier);
    assert_eq!(registry.store().count_records(Some("orders")).await.unwrap(), 2);
}

#[tokio::test]
async fn test_namespace_and_entity_type_isolate_records() {
    let registry = Registry::new(SqliteStore::open_memory().unwrap());

    let orders = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();
    let billing = registry
        .get_or_create("billing", "customer", &acme())
        .await
        .unwrap();
    let supplier = registry
        .get_or_create("orders", "supplier", &acme())
        .await
        .unwrap();

    assert_ne!(orders.identifier, billing.identifier);
    assert_ne!(orders.identifier, supplier.identifier);
    assert_ne!(billing.identifier, supplier.identifier);
    assert_eq!(registry.store().count_records(None).await.unwrap(), 3);
}

#[tokio::test]
async fn test_empty_metadata_is_a_valid_identity() {
    let registry = Registry::new(MemoryStore::new());

    let a = registry
        .get_or_create("orders", "batch", &Metadata::new())
        .await
        .unwrap();
    let b = registry
        .get_or_create("orders", "batch", &Metadata::new())
        .await
        .unwrap();
    assert_eq!(a.identifier, b.identifier);
    assert_eq!(a.fingerprint.as_str(), "{}");
}

#[tokio::test]
async fn test_scalar_values_are_normalized_to_strings() {
    let registry = Registry::new(MemoryStore::new());

    let numeric = Metadata::new().with("seat", 12).with("vip", true);
    let textual = Metadata::new().with("vip", "true").with("seat", "12");
    let a = registry
        .get_or_create("events", "ticket", &numeric)
        .await
        .unwrap();
    let b = registry
        .get_or_create("events", "ticket", &textual)
        .await
        .unwrap();

    assert_eq!(a.identifier, b.identifier);
    assert_eq!(a.metadata.get("seat"), Some("12"));
    assert_eq!(a.metadata.get("vip"), Some("true"));
}

#[tokio::test]
async fn test_nested_metadata_rejected_without_creating_record() {
    let registry = Registry::new(SqliteStore::open_memory().unwrap());

    let nested = Metadata::new()
        .with("name", "Acme")
        .with("tags", json!(["a", "b"]));
    let err = registry
        .get_or_create("orders", "customer", &nested)
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::InvalidMetadataValue(_)));
    assert!(!err.is_retryable());
    assert_eq!(registry.store().count_records(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_lookup_by_identifier() {
    let registry = Registry::new(SqliteStore::open_memory().unwrap());
    let record = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();

    assert_eq!(registry.lookup(&record.identifier).await.unwrap(), Some(record));
    assert_eq!(registry.lookup(&PublicId::generate()).await.unwrap(), None);
}

#[tokio::test]
async fn test_documented_example_response() {
    let registry = Registry::new(SqliteStore::open_memory().unwrap());

    let request = RegisterRequest::from_json(&json!({
        "namespace": "orders",
        "entity_type": "customer",
        "metadata": {"name": "Acme", "region": "EU"}
    }))
    .unwrap();
    let first = IdentifierResponse::from(registry.register(&request).await.unwrap());

    let reordered = RegisterRequest::from_slice(
        br#"{"entity_type": "customer", "metadata": {"region": "EU", "name": "Acme"}, "namespace": "orders"}"#,
    )
    .unwrap();
    let second = IdentifierResponse::from(registry.register(&reordered).await.unwrap());

    assert_eq!(first, second);
    assert!(first.created.ends_with('Z'));

    let body = serde_json::to_value(&first).unwrap();
    assert_eq!(body["namespace"], "orders");
    assert_eq!(body["entity_type"], "customer");
    assert_eq!(body["metadata"], json!({"name": "Acme", "region": "EU"}));
    assert_eq!(body["uuid"], first.uuid.to_string());
    assert_eq!(body.as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn test_records_are_durable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    let original = {
        let registry = Registry::new(SqliteStore::open(&path).unwrap());
        registry.get_or_create("orders", "customer", &acme()).await.unwrap()
    };

    let registry = Registry::new(SqliteStore::open(&path).unwrap());
    let again = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();
    assert_eq!(original, again);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_with_independent_handles_converge() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");
    // Initialize the schema once, as process startup would.
    SqliteStore::open(&path).unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let path = path.clone();
            tokio::spawn(async move {
                // Each caller has its own store handle, like a separate process.
                let registry = Registry::new(SqliteStore::open(&path).unwrap());
                let metadata = acme();
                let result = registry
                    .get_or_create("orders", "customer", &metadata)
                    .await;
                result
            })
        })
        .collect();

    let mut records = Vec::new();
    for task in tasks {
        records.push(task.await.unwrap().unwrap());
    }

    let winner = &records[0];
    assert!(records.iter().all(|r| r == winner));

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.count_records(None).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_on_shared_registry_converge() {
    let registry = Registry::new(MemoryStore::new());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let registry = registry.clone();
            // Alternate key order between callers.
            let metadata = if i % 2 == 0 {
                acme()
            } else {
                Metadata::new().with("region", "EU").with("name", "Acme")
            };
            tokio::spawn(async move {
                let result = registry
                    .get_or_create("orders", "customer", &metadata)
                    .await;
                result
            })
        })
        .collect();

    let mut identifiers = Vec::new();
    for task in tasks {
        identifiers.push(task.await.unwrap().unwrap().identifier);
    }
    identifiers.dedup();
    assert_eq!(identifiers.len(), 1);
    assert_eq!(registry.store().count_records(None).await.unwrap(), 1);
}

/// Hides the first lookup, reproducing a caller that checked just before
/// another caller committed the same key.
struct MissFirstLookup<S> {
    inner: S,
    missed: AtomicBool,
}

#[async_trait]
impl<S: Store> Store for MissFirstLookup<S> {
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<RegistryRecord>, StoreError> {
        if !self.missed.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_key(key).await
    }

    async fn insert_record(&self, record: &PendingRecord) -> Result<InsertResult, StoreError> {
        self.inner.insert_record(record).await
    }

    async fn find_by_identifier(
        &self,
        identifier: &PublicId,
    ) -> Result<Option<RegistryRecord>, StoreError> {
        self.inner.find_by_identifier(identifier).await
    }

    async fn count_records(&self, namespace: Option<&str>) -> Result<u64, StoreError> {
        self.inner.count_records(namespace).await
    }
}

#[tokio::test]
async fn test_race_loser_adopts_winner_record() {
    let shared = Arc::new(SqliteStore::open_memory().unwrap());
    let winner = Registry::from_shared(Arc::clone(&shared))
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();

    let loser = Registry::new(MissFirstLookup {
        inner: Arc::clone(&shared),
        missed: AtomicBool::new(false),
    });
    let adopted = loser
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();

    assert_eq!(adopted, winner);
    assert_eq!(shared.count_records(None).await.unwrap(), 1);
}

/// Rejects every insert as a duplicate yet never has a record.
struct PhantomConflict;

#[async_trait]
impl Store for PhantomConflict {
    async fn find_by_key(&self, _key: &IdentityKey) -> Result<Option<RegistryRecord>, StoreError> {
        Ok(None)
    }

    async fn insert_record(&self, _record: &PendingRecord) -> Result<InsertResult, StoreError> {
        Ok(InsertResult::AlreadyExists)
    }

    async fn find_by_identifier(
        &self,
        _identifier: &PublicId,
    ) -> Result<Option<RegistryRecord>, StoreError> {
        Ok(None)
    }

    async fn count_records(&self, _namespace: Option<&str>) -> Result<u64, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_conflict_without_record_is_invariant_violation() {
    let registry = Registry::new(PhantomConflict);
    let err = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap_err();

    match err {
        RegistryError::InvariantViolation {
            ref namespace,
            ref entity_type,
            ref fingerprint_digest,
        } => {
            assert_eq!(namespace, "orders");
            assert_eq!(entity_type, "customer");
            assert_eq!(fingerprint_digest.len(), 16);
        }
        ref other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_retryable());
}

/// A store whose backend is down.
struct Unavailable;

#[async_trait]
impl Store for Unavailable {
    async fn find_by_key(&self, _key: &IdentityKey) -> Result<Option<RegistryRecord>, StoreError> {
        Err(StoreError::Task("backend offline".into()))
    }

    async fn insert_record(&self, _record: &PendingRecord) -> Result<InsertResult, StoreError> {
        Err(StoreError::Task("backend offline".into()))
    }

    async fn find_by_identifier(
        &self,
        _identifier: &PublicId,
    ) -> Result<Option<RegistryRecord>, StoreError> {
        Err(StoreError::Task("backend offline".into()))
    }

    async fn count_records(&self, _namespace: Option<&str>) -> Result<u64, StoreError> {
        Err(StoreError::Task("backend offline".into()))
    }
}

#[tokio::test]
async fn test_storage_failure_is_surfaced_as_retryable() {
    let registry = Registry::new(Unavailable);

    let err = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::StorageUnavailable(_)));
    assert!(err.is_retryable());

    assert!(matches!(
        registry.lookup(&PublicId::generate()).await,
        Err(RegistryError::StorageUnavailable(_))
    ));
}

#[tokio::test]
async fn test_locked_database_is_retryable_and_leaves_nothing_behind() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let config = SqliteConfig::new(&path).busy_timeout_ms(100);
    let store = SqliteStore::open_with_config(config).unwrap();
    assert_eq!(store.config().unwrap().busy_timeout_ms, 100);
    let registry = Registry::new(store);

    // Another process holds the write lock past the busy timeout
    let blocker = rusqlite::Connection::open(&path).unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let err = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap_err();
    assert!(
        matches!(err, RegistryError::StorageUnavailable(StoreError::Database(_))),
        "unexpected error: {err}"
    );
    assert!(err.is_retryable());

    blocker.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(registry.store().count_records(None).await.unwrap(), 0);

    let record = registry
        .get_or_create("orders", "customer", &acme())
        .await
        .unwrap();
    assert_eq!(registry.store().count_records(None).await.unwrap(), 1);
    assert_eq!(
        registry.lookup(&record.identifier).await.unwrap(),
        Some(record)
    );
}
