//! Error types for the validator accumulator core.

use thiserror::Error;

/// Core errors raised while encoding or decoding records and receipts.
///
/// Accumulator and receipt operations are total and never produce these;
/// only the binary codecs do.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("truncated record: {field} needs {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("unsupported record version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid directory flag byte: {0:#04x}")]
    InvalidFlag(u8),

    #[error("too many {field} for the record layout: {count}")]
    TooMany { field: &'static str, count: usize },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
