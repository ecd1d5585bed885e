//! # Validator Accumulator Testkit
//!
//! Testing utilities for the validator accumulator.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known roots and record hashes for cross-implementation checks
//! - **Generators**: Proptest strategies for hashes, entries and records
//! - **Fixtures**: Ready-made stores and accumulators for integration tests
//! - **Workloads**: Seeded synthetic entry streams, with optional duplicates
//!
//! ## Golden Vectors
//!
//! ```rust
//! use valacc_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, root) in verify_all_vectors() {
//!     assert!(ok, "{name}: {root}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use valacc_core::{ChainAccumulator, Receipt};
//! use valacc_testkit::generators::distinct_hashes;
//!
//! proptest! {
//!     #[test]
//!     fn last_entry_receipt_validates(entries in distinct_hashes(1..500)) {
//!         let last = *entries.last().unwrap();
//!         prop_assert!(Receipt::build(&entries, last).unwrap().validate());
//!     }
//! }
//! ```
//!
//! ## Workloads
//!
//! ```rust
//! use valacc_testkit::workload::Workload;
//!
//! let mut workload = Workload::new(7, 100).with_duplicate_rate(0.1);
//! let batch = workload.batch(1_000);
//! assert_eq!(batch.len(), 1_000);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;
pub mod workload;

pub use fixtures::{entry_sequence, SqliteFixture, TestFixture};
pub use workload::Workload;
