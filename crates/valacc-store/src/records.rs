//! Record persistence over a key-value [`Store`].
//!
//! Each chain's records form a linked log: `NodeFirst` names the first record,
//! `NodeNext` links each record to its successor and `NodeHead` names the
//! latest. Directory records are also indexed by height, and leaf records
//! index every entry they hold so duplicates can be detected across blocks.

use std::collections::HashSet;
use std::future::Future;

use valacc_core::{BlockHeight, ChainId, DirectoryRecord, Sha256Hash};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::traits::{Bucket, Store};

/// Extension trait for storing and indexing sealed records.
pub trait RecordStore: Store {
    /// Persist a record and update its chain's indexes.
    ///
    /// A record with a nonzero sequence must extend an existing chain.
    /// Returns the record hash. Storing the current head again is a no-op.
    fn put_record(
        &self,
        record: &DirectoryRecord,
    ) -> impl Future<Output = Result<Sha256Hash>> + Send;

    /// Load a record by hash.
    fn get_record(
        &self,
        hash: &Sha256Hash,
    ) -> impl Future<Output = Result<Option<DirectoryRecord>>> + Send;

    /// Hash of the latest record for a chain.
    fn head_hash(&self, chain_id: &ChainId)
        -> impl Future<Output = Result<Option<Sha256Hash>>> + Send;

    /// Latest record for a chain along with its hash.
    fn head_record(
        &self,
        chain_id: &ChainId,
    ) -> impl Future<Output = Result<Option<(Sha256Hash, DirectoryRecord)>>> + Send;

    /// Hash of the first record for a chain.
    fn first_hash(
        &self,
        chain_id: &ChainId,
    ) -> impl Future<Output = Result<Option<Sha256Hash>>> + Send;

    /// Hash of the record following `hash` in its chain.
    fn next_hash(&self, hash: &Sha256Hash)
        -> impl Future<Output = Result<Option<Sha256Hash>>> + Send;

    /// Hash of the directory record an accumulator sealed at `height`.
    fn directory_at_height(
        &self,
        chain_id: &ChainId,
        height: BlockHeight,
    ) -> impl Future<Output = Result<Option<Sha256Hash>>> + Send;

    /// Hash of the leaf record that committed `entry` on `chain_id`.
    fn entry_record_hash(
        &self,
        chain_id: &ChainId,
        entry: &Sha256Hash,
    ) -> impl Future<Output = Result<Option<Sha256Hash>>> + Send;

    /// Every record of a chain, first to latest.
    fn chain_records(
        &self,
        chain_id: &ChainId,
    ) -> impl Future<Output = Result<Vec<DirectoryRecord>>> + Send;
}

impl<S: Store + ?Sized> RecordStore for S {
    async fn put_record(&self, record: &DirectoryRecord) -> Result<Sha256Hash> {
        let encoded = record.encode()?;
        let hash = Sha256Hash::digest(&encoded);
        let chain_key = keys::chain(&record.chain_id);

        let head = match self.head_hash(&record.chain_id).await? {
            Some(head) if head == hash => return Ok(hash),
            None if record.sequence != 0 => {
                return Err(StoreError::ChainLinkage {
                    chain_id: record.chain_id,
                    sequence: record.sequence,
                })
            }
            head => head,
        };

        // Body and indexes before the link, link before the head: a failed put
        // leaves the walkable log ending at the current head.
        self.put(Bucket::Node, &keys::record(&hash), &encoded).await?;

        if record.is_directory {
            self.put(
                Bucket::DirectoryBlockHeight,
                &keys::height(&record.chain_id, record.height),
                hash.as_bytes(),
            )
            .await?;
        } else {
            for entry in &record.entries {
                self.put(
                    Bucket::EntryNode,
                    &keys::entry(&record.chain_id, entry),
                    hash.as_bytes(),
                )
                .await?;
            }
        }

        match head {
            Some(head) => {
                self.put(Bucket::NodeNext, &keys::record(&head), hash.as_bytes())
                    .await?
            }
            None => self.put(Bucket::NodeFirst, &chain_key, hash.as_bytes()).await?,
        }
        self.put(Bucket::NodeHead, &chain_key, hash.as_bytes()).await?;

        tracing::trace!(
            chain = %record.chain_id,
            sequence = record.sequence,
            height = record.height,
            hash = %hash,
            "stored record"
        );
        Ok(hash)
    }

    async fn get_record(&self, hash: &Sha256Hash) -> Result<Option<DirectoryRecord>> {
        match self.get(Bucket::Node, &keys::record(hash)).await? {
            Some(bytes) => {
                let (record, _) = DirectoryRecord::decode(&bytes)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn head_hash(&self, chain_id: &ChainId) -> Result<Option<Sha256Hash>> {
        get_hash(self, Bucket::NodeHead, &keys::chain(chain_id)).await
    }

    async fn head_record(
        &self,
        chain_id: &ChainId,
    ) -> Result<Option<(Sha256Hash, DirectoryRecord)>> {
        let Some(hash) = self.head_hash(chain_id).await? else {
            return Ok(None);
        };
        let record = self
            .get_record(&hash)
            .await?
            .ok_or(StoreError::MissingRecord(hash))?;
        Ok(Some((hash, record)))
    }

    async fn first_hash(&self, chain_id: &ChainId) -> Result<Option<Sha256Hash>> {
        get_hash(self, Bucket::NodeFirst, &keys::chain(chain_id)).await
    }

    async fn next_hash(&self, hash: &Sha256Hash) -> Result<Option<Sha256Hash>> {
        get_hash(self, Bucket::NodeNext, &keys::record(hash)).await
    }

    async fn directory_at_height(
        &self,
        chain_id: &ChainId,
        height: BlockHeight,
    ) -> Result<Option<Sha256Hash>> {
        get_hash(self, Bucket::DirectoryBlockHeight, &keys::height(chain_id, height)).await
    }

    async fn entry_record_hash(
        &self,
        chain_id: &ChainId,
        entry: &Sha256Hash,
    ) -> Result<Option<Sha256Hash>> {
        get_hash(self, Bucket::EntryNode, &keys::entry(chain_id, entry)).await
    }

    async fn chain_records(&self, chain_id: &ChainId) -> Result<Vec<DirectoryRecord>> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.first_hash(chain_id).await?;

        while let Some(hash) = cursor {
            if !seen.insert(hash) {
                return Err(StoreError::InvalidData(format!(
                    "record chain {} loops at {}",
                    chain_id, hash
                )));
            }
            let record = self
                .get_record(&hash)
                .await?
                .ok_or(StoreError::MissingRecord(hash))?;
            records.push(record);
            cursor = self.next_hash(&hash).await?;
        }
        Ok(records)
    }
}

async fn get_hash<S: Store + ?Sized>(
    store: &S,
    bucket: Bucket,
    key: &[u8],
) -> Result<Option<Sha256Hash>> {
    match store.get(bucket, key).await? {
        Some(bytes) => Sha256Hash::try_from(bytes.as_slice()).map(Some).map_err(|_| {
            StoreError::InvalidData(format!(
                "{} value is {} bytes, expected 32",
                bucket,
                bytes.len()
            ))
        }),
        None => Ok(None),
    }
}
