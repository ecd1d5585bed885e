//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use valacc::{AccumulatorConfig, AccumulatorHandle, BlockAccumulator};
use valacc_core::{ChainId, EntryHash, Sha256Hash};
use valacc_store::{MemoryStore, SqliteStore};

/// `SHA-256("E1")` through `SHA-256("En")`.
pub fn entry_sequence(n: usize) -> Vec<Sha256Hash> {
    (1..=n)
        .map(|i| Sha256Hash::digest(format!("E{i}").as_bytes()))
        .collect()
}

/// `n` distinct entries on the chain named `chain`.
pub fn chain_entries(chain: &str, n: usize) -> Vec<EntryHash> {
    let chain_id = ChainId::derive(chain);
    (0..n)
        .map(|i| EntryHash::new(chain_id, Sha256Hash::digest(format!("{chain} E{i}").as_bytes())))
        .collect()
}

/// A test fixture with a memory store.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub config: AccumulatorConfig,
}

impl TestFixture {
    /// Create a fixture with the default accumulator configuration.
    pub fn new() -> Self {
        Self::with_config(AccumulatorConfig::default())
    }

    pub fn with_config(config: AccumulatorConfig) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            config,
        }
    }

    /// Open an accumulator over the fixture's store.
    pub async fn accumulator(&self) -> valacc::Result<BlockAccumulator<MemoryStore>> {
        BlockAccumulator::open(self.store.clone(), self.config.clone()).await
    }

    /// Open and spawn an accumulator over the fixture's store.
    pub async fn spawn(&self) -> valacc::Result<AccumulatorHandle> {
        Ok(self.accumulator().await?.spawn())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A SQLite database in a temporary directory.
///
/// The directory is removed when the fixture is dropped, so reopening the
/// store across simulated restarts works for as long as the fixture lives.
pub struct SqliteFixture {
    dir: TempDir,
}

impl SqliteFixture {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("valacc.db")
    }

    /// Open (or reopen) the store.
    pub fn open(&self) -> valacc_store::Result<Arc<SqliteStore>> {
        Ok(Arc::new(SqliteStore::open(self.path())?))
    }

    /// Open an accumulator over a fresh connection to the store.
    pub async fn accumulator(
        &self,
        config: AccumulatorConfig,
    ) -> valacc::Result<BlockAccumulator<SqliteStore>> {
        BlockAccumulator::open(self.open()?, config).await
    }
}
