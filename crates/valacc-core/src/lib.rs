//! # Validator Accumulator Core
//!
//! Pure primitives for the validator accumulator: hashes, per-chain Merkle
//! accumulators, inclusion receipts, and the sealed record codec.
//!
//! This crate contains no I/O, no storage, no async. It is pure computation
//! over SHA-256 digests.
//!
//! ## Key Types
//!
//! - [`Sha256Hash`] - 32-byte digest with the accumulator's `combine` rule
//! - [`ChainAccumulator`] - Incremental Merkle right edge for one chain
//! - [`Receipt`] - Proof that an entry is committed to a root
//! - [`DirectoryRecord`] - Sealed block or chain record, content addressed
//! - [`EntryHash`] - An entry submitted for a chain
//!
//! ## Combine
//!
//! Every interior node is `SHA256(SHA256(left) || SHA256(right))`. Both operands
//! are hashed before concatenation. See [`Sha256Hash::combine`].

pub mod accumulator;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod receipt;
pub mod record;
pub mod types;

pub use accumulator::ChainAccumulator;
pub use crypto::Sha256Hash;
pub use entry::EntryHash;
pub use error::{CoreError, Result};
pub use receipt::{Receipt, ReceiptBuilder, ReceiptStep, Side};
pub use record::{ChainRoot, DirectoryRecord, RECORD_VERSION};
pub use types::{BlockHeight, ChainId};
