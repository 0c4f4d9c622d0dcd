//! # Identifier Registry
//!
//! Stable, globally unique identifiers for logical entities.
//!
//! ## Overview
//!
//! An entity is described by a namespace, an entity type, and a flat
//! metadata mapping. The registry guarantees:
//!
//! - **Idempotence**: describing the same entity again returns the same identifier
//! - **Order independence**: metadata key order never matters
//! - **Distinctness**: any difference in namespace, type, or metadata gives a new identifier
//! - **Race convergence**: concurrent first requests for one entity all get one record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idreg::{Metadata, Registry};
//! use idreg::store::SqliteStore;
//!
//! async fn example() {
//!     // Open storage; this initializes the schema once
//!     let store = SqliteStore::open("registry.db").unwrap();
//!     let registry = Registry::new(store);
//!
//!     let metadata = Metadata::new().with("name", "Acme").with("region", "EU");
//!     let record = registry
//!         .get_or_create("orders", "customer", &metadata)
//!         .await
//!         .unwrap();
//!
//!     // Same entity, different key order: same identifier
//!     let again = Metadata::new().with("region", "EU").with("name", "Acme");
//!     let same = registry.get_or_create("orders", "customer", &again).await.unwrap();
//!     assert_eq!(record.identifier, same.identifier);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `idreg::core` - Canonicalization and record types
//! - `idreg::store` - Storage abstraction and SQLite

pub mod error;
pub mod registry;
pub mod request;

// Re-export component crates
pub use idreg_core as core;
pub use idreg_store as store;

// Re-export main types for convenience
pub use error::{RegistryError, Result};
pub use registry::Registry;
pub use request::{IdentifierResponse, RegisterRequest, RequestError};

// Re-export commonly used core types
pub use idreg_core::{
    canonicalize, Fingerprint, IdentityKey, Metadata, NormalizedMetadata, PublicId,
    RegistryRecord,
};
