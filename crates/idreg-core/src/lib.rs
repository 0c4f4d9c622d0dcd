//! # Identifier Registry Core
//!
//! Pure primitives for the identifier registry: metadata canonicalization,
//! identity keys, and registry records.
//!
//! This crate contains no I/O and no storage. It turns caller metadata into
//! a byte-stable fingerprint and defines the record shape the store persists.
//!
//! ## Key Types
//!
//! - [`Metadata`] - Caller-supplied key/value metadata
//! - [`NormalizedMetadata`] - Metadata with every value stringified
//! - [`Fingerprint`] - Canonical, order-independent encoding of normalized metadata
//! - [`IdentityKey`] - `(namespace, entity_type, fingerprint)`, the uniqueness key
//! - [`PublicId`] - Random 128-bit public identifier
//! - [`RegistryRecord`] - A stored record
//!
//! ## Canonicalization
//!
//! See the [`canonical`] module for the exact encoding.

pub mod canonical;
pub mod error;
pub mod metadata;
pub mod record;
pub mod types;

pub use canonical::{canonical_value, canonicalize, normalize};
pub use error::{CoreError, Result};
pub use metadata::{Metadata, NormalizedMetadata};
pub use record::{format_timestamp, now_micros, parse_timestamp, PendingRecord, RegistryRecord};
pub use types::{Fingerprint, IdentityKey, PublicId};
