//! Store trait: the abstract key-value interface.
//!
//! Values are opaque bytes. Keys are scoped by [`Bucket`]; see [`crate::keys`]
//! for how each bucket's keys are built.

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

/// The buckets the accumulator reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Record hash -> encoded record.
    Node,
    /// Chain id -> hash of the chain's latest record.
    NodeHead,
    /// Chain id -> hash of the chain's first record.
    NodeFirst,
    /// Record hash -> hash of the next record in the same chain.
    NodeNext,
    /// Chain id and entry hash -> hash of the leaf record holding the entry.
    EntryNode,
    /// Accumulator chain id and height -> directory record hash.
    DirectoryBlockHeight,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::Node,
        Bucket::NodeHead,
        Bucket::NodeFirst,
        Bucket::NodeNext,
        Bucket::EntryNode,
        Bucket::DirectoryBlockHeight,
    ];

    /// Name used as the bucket column in persistent stores.
    pub const fn name(self) -> &'static str {
        match self {
            Bucket::Node => "node",
            Bucket::NodeHead => "nodeHead",
            Bucket::NodeFirst => "nodeFirst",
            Bucket::NodeNext => "nodeNext",
            Bucket::EntryNode => "entryNode",
            Bucket::DirectoryBlockHeight => "dbHeight",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The Store trait: async key-value persistence.
///
/// Implementations must be safe for concurrent use. Many leaf writes from one
/// block and writes from several accumulators run against the same store.
/// A put replaces any existing value for the key.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get the value at `key`, if any.
    async fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Write `value` at `key`.
    async fn put(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<()>;

    /// Check whether `key` is present.
    async fn contains(&self, bucket: Bucket, key: &[u8]) -> Result<bool> {
        Ok(self.get(bucket, key).await?.is_some())
    }

    /// Number of keys in a bucket.
    async fn count(&self, bucket: Bucket) -> Result<u64>;
}
