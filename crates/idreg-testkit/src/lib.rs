//! # Identifier Registry Testkit
//!
//! Testing utilities for the identifier registry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known metadata with the fingerprint it must produce
//! - **Generators**: Proptest strategies for metadata and identity inputs
//! - **Fixtures**: Registries over in-memory or temporary SQLite storage
//!
//! ## Golden Vectors
//!
//! Fingerprints are persisted, so their encoding must never drift:
//!
//! ```rust
//! use idreg_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     assert!(matches, "{name}: {actual}");
//! }
//! # assert!(!all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use idreg_core::canonicalize;
//! use idreg_testkit::generators::shuffled_metadata;
//!
//! proptest! {
//!     #[test]
//!     fn order_is_irrelevant((a, b) in shuffled_metadata()) {
//!         prop_assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use idreg_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let registry = fixture.registry();
//! # let _ = registry;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{acme_metadata, SqliteFixture, TestFixture};
pub use generators::{metadata_from_pairs, scalar_metadata, shuffled_metadata, MetadataParams};
pub use vectors::{all_vectors, metadata_from_vector, verify_all_vectors, GoldenVector};
