//! # Validator Accumulator Store
//!
//! Storage for sealed records. The accumulator sees storage as a bucketed
//! key-value map behind the async [`Store`] trait; record indexing (chain
//! heads, record links, the entry index, directory heights) is layered on top
//! by [`RecordStore`].
//!
//! ## Key Types
//!
//! - [`Store`] - Async get/put by (bucket, key)
//! - [`Bucket`] - The fixed set of buckets
//! - [`SqliteStore`] - SQLite-backed persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`RecordStore`] - Record persistence and lookup over any `Store`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use valacc_store::{RecordStore, SqliteStore};
//! use valacc_core::ChainId;
//!
//! async fn example() {
//!     let store = SqliteStore::open("valacc.db").unwrap();
//!     let head = store.head_record(&ChainId::derive("C")).await.unwrap();
//!     println!("{:?}", head.map(|(_, r)| r.sequence));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Last writer wins**: a put overwrites any value at the same key.
//! - **No transactions**: each index update is an independent put.
//! - **Per-chain logs**: every record links to the prior record of its chain.

pub mod error;
pub mod keys;
pub mod memory;
pub mod migration;
pub mod records;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use records::RecordStore;
pub use sqlite::SqliteStore;
pub use traits::{Bucket, Store};
