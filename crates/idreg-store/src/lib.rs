//! # Identifier Registry Store
//!
//! Storage abstraction for the identifier registry. Provides a trait-based
//! interface for record persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts record storage behind the [`Store`] trait,
//! keeping the registry storage-agnostic. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a pending record
//! - [`SqliteConfig`] - Path and pragmas for a file-backed store
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idreg_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open (and initialize) a SQLite database
//!     let store = SqliteStore::open("registry.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let total = store.count_records(None).await.unwrap();
//!     assert_eq!(total, 0);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Uniqueness constraint**: one record per `(namespace, entity_type, fingerprint)`
//! - **Race arbitration**: a duplicate insert returns `AlreadyExists`, never an error
//! - **Append-only**: no update or delete operations exist
//! - **Scoped connections**: file-backed stores open a connection per operation

pub mod config;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use config::{JournalMode, SqliteConfig, SyncMode, DEFAULT_BUSY_TIMEOUT_MS};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, Store};
