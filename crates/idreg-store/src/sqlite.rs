//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the registry. It uses rusqlite
//! with bundled SQLite, wrapped in async via `tokio::task::spawn_blocking`.
//!
//! A file-backed store holds no connection between operations. Each
//! operation opens its own connection, applies the configured pragmas, and
//! closes it when the operation returns, so any number of store handles in
//! any number of processes can share one database file. The
//! `UNIQUE(namespace, entity_type, fingerprint)` constraint is the only
//! concurrency control.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension};

use idreg_core::{
    format_timestamp, parse_timestamp, Fingerprint, IdentityKey, NormalizedMetadata,
    PendingRecord, PublicId, RegistryRecord,
};

use crate::config::SqliteConfig;
use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InsertResult, Store};

const RECORD_COLUMNS: &str = "id, uuid, namespace, entity_type, fingerprint, created";

/// SQLite-based store implementation.
#[derive(Clone)]
pub struct SqliteStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    /// Connection per operation against a database file.
    File(Arc<SqliteConfig>),
    /// A private in-memory database lives only as long as its connection,
    /// so that one connection is pinned and serialized behind a mutex.
    Memory(Arc<Mutex<Connection>>),
}

impl SqliteStore {
    /// Open a SQLite database at the given path with default settings.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(SqliteConfig::new(path))
    }

    /// Open a SQLite database described by `config`.
    ///
    /// This is the one-time schema initialization step; later operations
    /// never touch the schema.
    pub fn open_with_config(config: SqliteConfig) -> Result<Self> {
        ensure_parent_dir(&config.path)?;
        let mut conn = open_connection(&config)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %config.path.display(), "opened registry store");
        Ok(Self {
            backend: Backend::File(Arc::new(config)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            backend: Backend::Memory(Arc::new(Mutex::new(conn))),
        })
    }

    /// The configuration of a file-backed store.
    pub fn config(&self) -> Option<&SqliteConfig> {
        match &self.backend {
            Backend::File(config) => Some(config),
            Backend::Memory(_) => None,
        }
    }

    /// Run `f` against a connection on the blocking pool.
    ///
    /// The connection is acquired inside the task and released when `f`
    /// returns, whatever the outcome.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let backend = self.backend.clone();

        tokio::task::spawn_blocking(move || match backend {
            Backend::File(config) => {
                let mut conn = open_connection(&config)?;
                f(&mut conn)
            }
            Backend::Memory(conn) => {
                let mut conn = conn
                    .lock()
                    .map_err(|e| StoreError::Poisoned(format!("memory connection: {}", e)))?;
                f(&mut conn)
            }
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Creates the parent directory of the database file if it is missing.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(StoreError::InvalidData(format!(
            "store path {} is a directory",
            path.display()
        )));
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Opens a connection and applies the configured pragmas.
///
/// The busy timeout goes first so the journal mode switch also waits on a
/// concurrent writer instead of failing.
fn open_connection(config: &SqliteConfig) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(&config.path, flags)?;
    conn.busy_timeout(config.busy_timeout())?;
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = {};",
        config.journal_mode.pragma_value()
    ))?;
    conn.execute_batch(&format!(
        "PRAGMA synchronous = {};",
        config.synchronous.pragma_value()
    ))?;
    Ok(conn)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

// Helper to convert a row to a RegistryRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistryRecord> {
    let uuid: String = row.get("uuid")?;
    let fingerprint = Fingerprint::from_stored(row.get("fingerprint")?);
    let created: String = row.get("created")?;

    let identifier: PublicId = uuid.parse().map_err(|e| conversion_error(1, e))?;
    let metadata =
        NormalizedMetadata::from_fingerprint(&fingerprint).map_err(|e| conversion_error(4, e))?;
    let created_at = parse_timestamp(&created).map_err(|e| conversion_error(5, e))?;

    Ok(RegistryRecord {
        id: row.get("id")?,
        identifier,
        namespace: row.get("namespace")?,
        entity_type: row.get("entity_type")?,
        fingerprint,
        metadata,
        created_at,
    })
}

/// Whether an insert failed on the identity key uniqueness constraint.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_by_key(&self, key: &IdentityKey) -> Result<Option<RegistryRecord>> {
        let key = key.clone();

        self.with_conn(move |conn| {
            tracing::trace!(
                namespace = %key.namespace,
                entity_type = %key.entity_type,
                "find_by_key"
            );
            conn.query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM registry_records
                     WHERE namespace = ?1 AND entity_type = ?2 AND fingerprint = ?3"
                ),
                params![key.namespace, key.entity_type, key.fingerprint.as_str()],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn insert_record(&self, record: &PendingRecord) -> Result<InsertResult> {
        let record = record.clone();

        self.with_conn(move |conn| {
            tracing::trace!(identifier = %record.identifier, "insert_record");
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO registry_records (uuid, namespace, entity_type, fingerprint, created)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.identifier.to_string(),
                    record.key.namespace,
                    record.key.entity_type,
                    record.key.fingerprint.as_str(),
                    format_timestamp(&record.created_at),
                ],
            );

            match inserted {
                Ok(_) => {
                    let id = tx.last_insert_rowid();
                    tx.commit()?;
                    Ok(InsertResult::Inserted(record.into_record(id)))
                }
                // Dropping the transaction rolls it back.
                Err(e) if is_unique_violation(&e) => Ok(InsertResult::AlreadyExists),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn find_by_identifier(&self, identifier: &PublicId) -> Result<Option<RegistryRecord>> {
        let identifier = identifier.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM registry_records WHERE uuid = ?1"),
                params![identifier],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn count_records(&self, namespace: Option<&str>) -> Result<u64> {
        let namespace = namespace.map(str::to_owned);

        self.with_conn(move |conn| {
            let count: i64 = match namespace {
                Some(ns) => conn.query_row(
                    "SELECT COUNT(*) FROM registry_records WHERE namespace = ?1",
                    params![ns],
                    |row| row.get(0),
                )?,
                None => conn.query_row("SELECT COUNT(*) FROM registry_records", [], |row| {
                    row.get(0)
                })?,
            };
            u64::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative count {count}")))
        })
        .await
    }
}
