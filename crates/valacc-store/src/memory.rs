//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::{Bucket, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<(Bucket, Vec<u8>), Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    // Poison is ignored: every write is a single map insert.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<(Bucket, Vec<u8>), Vec<u8>>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<(Bucket, Vec<u8>), Vec<u8>>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.read().get(&(bucket, key.to_vec())).cloned())
    }

    async fn put(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<()> {
        self.write().insert((bucket, key.to_vec()), value.to_vec());
        Ok(())
    }

    async fn contains(&self, bucket: Bucket, key: &[u8]) -> Result<bool> {
        Ok(self.read().contains_key(&(bucket, key.to_vec())))
    }

    async fn count(&self, bucket: Bucket) -> Result<u64> {
        Ok(self.read().keys().filter(|(b, _)| *b == bucket).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        assert_eq!(store.get(Bucket::Node, b"k").await.unwrap(), None);

        store.put(Bucket::Node, b"k", b"v1").await.unwrap();
        assert_eq!(store.get(Bucket::Node, b"k").await.unwrap(), Some(b"v1".to_vec()));
        assert!(store.contains(Bucket::Node, b"k").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_last_writer_wins() {
        let store = MemoryStore::new();
        store.put(Bucket::NodeHead, b"k", b"v1").await.unwrap();
        store.put(Bucket::NodeHead, b"k", b"v2").await.unwrap();
        assert_eq!(store.get(Bucket::NodeHead, b"k").await.unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.count(Bucket::NodeHead).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_buckets_are_separate() {
        let store = MemoryStore::new();
        store.put(Bucket::NodeHead, b"k", b"head").await.unwrap();
        assert!(!store.contains(Bucket::NodeFirst, b"k").await.unwrap());
        assert_eq!(store.count(Bucket::NodeFirst).await.unwrap(), 0);
    }
}
