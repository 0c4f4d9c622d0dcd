//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use idreg::Registry;
use idreg_core::Metadata;
use idreg_store::{MemoryStore, SqliteConfig, SqliteStore};

/// A registry over a fresh in-memory store.
pub struct TestFixture {
    store: Arc<MemoryStore>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// A registry sharing this fixture's store.
    pub fn registry(&self) -> Registry<MemoryStore> {
        Registry::from_shared(Arc::clone(&self.store))
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A SQLite database file in a temporary directory.
///
/// The directory is removed when the fixture drops.
pub struct SqliteFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl SqliteFixture {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("registry.db");
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default configuration for this fixture's database.
    pub fn config(&self) -> SqliteConfig {
        SqliteConfig::new(&self.path)
    }

    /// Open an independent store handle on the database.
    pub fn open(&self) -> idreg_store::Result<SqliteStore> {
        SqliteStore::open_with_config(self.config())
    }

    /// Open a registry over an independent store handle.
    pub fn registry(&self) -> idreg_store::Result<Registry<SqliteStore>> {
        Ok(Registry::new(self.open()?))
    }
}

/// The metadata used in the registry's documented example.
pub fn acme_metadata() -> Metadata {
    Metadata::new().with("name", "Acme").with("region", "EU")
}
