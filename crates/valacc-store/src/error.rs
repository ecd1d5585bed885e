//! Error types for the store module.

use thiserror::Error;
use valacc_core::{ChainId, CoreError, Sha256Hash};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored record failed to encode or decode.
    #[error("record encoding error: {0}")]
    Encoding(#[from] CoreError),

    /// A record with a nonzero sequence has no predecessor for its chain.
    #[error("chain {chain_id} has no head for record at sequence {sequence}")]
    ChainLinkage { chain_id: ChainId, sequence: u32 },

    /// An index points at a record that is not stored.
    #[error("missing record: {0}")]
    MissingRecord(Sha256Hash),

    /// A stored value has the wrong shape.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking database task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    TaskJoin(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
