//! # Validator Accumulator
//!
//! Ingests a stream of entry hashes tagged with chain ids and seals them into
//! blocks. Each block commits every touched chain's Merkle root into one
//! directory record, linked to the previous directory record by hash.
//!
//! ## Overview
//!
//! - [`BlockAccumulator`] owns the open block for one shard and seals it
//! - [`AccumulatorHandle`] feeds a spawned accumulator and reads its root feed
//! - [`Router`] shards entries by chain id and seals every shard together
//! - [`BlockProof`] proves an entry is committed to a sealed block
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use valacc::{AccumulatorConfig, BlockAccumulator};
//! use valacc::core::{ChainId, EntryHash, Sha256Hash};
//! use valacc::store::SqliteStore;
//!
//! async fn example() {
//!     let store = Arc::new(SqliteStore::open("valacc.db").unwrap());
//!     let acc = BlockAccumulator::open(store, AccumulatorConfig::default())
//!         .await
//!         .unwrap();
//!     let handle = acc.spawn();
//!
//!     let chain = ChainId::derive("C");
//!     handle
//!         .ingest(EntryHash::new(chain, Sha256Hash::digest(b"E1")))
//!         .await
//!         .unwrap();
//!
//!     let sealed = handle.seal().await.unwrap();
//!     println!("block {} root {:?}", sealed.height, sealed.root);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `valacc::core` - Hashes, chain accumulators, receipts, records
//! - `valacc::store` - Storage trait, SQLite and in-memory stores

pub mod accumulator;
pub mod config;
pub mod error;
pub mod proof;
pub mod router;
pub mod stats;

pub use valacc_core as core;
pub use valacc_store as store;

pub use accumulator::{AccumulatorHandle, BlockAccumulator, SealedBlock};
pub use config::{AccumulatorConfig, RouterConfig};
pub use error::{AccumulatorError, Result};
pub use proof::BlockProof;
pub use router::{BlockReport, Router};
pub use stats::{AccumulatorStats, StatsSnapshot};

pub use valacc_core::{ChainAccumulator, ChainId, DirectoryRecord, EntryHash, Receipt, Sha256Hash};
