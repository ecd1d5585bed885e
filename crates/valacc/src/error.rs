//! Error types for the accumulator service.

use thiserror::Error;
use valacc_core::CoreError;
use valacc_store::StoreError;

/// Errors surfaced by block accumulators and the router.
#[derive(Debug, Error)]
pub enum AccumulatorError {
    /// Storage error that prevented a directory record from being written.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Record encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),

    /// The entry queue is full.
    #[error("entry queue is full")]
    QueueFull,

    /// The accumulator's worker is no longer running.
    #[error("accumulator {0} has stopped")]
    Stopped(String),

    /// The worker task panicked or was cancelled.
    #[error("accumulator task failed: {0}")]
    TaskJoin(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for accumulator operations.
pub type Result<T> = std::result::Result<T, AccumulatorError>;
