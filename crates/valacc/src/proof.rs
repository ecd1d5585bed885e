//! Block proofs: an entry receipt chained to a directory receipt.
//!
//! The entry receipt proves an entry is under its chain's root for one block.
//! The chain receipt proves that chain root is under the block's aggregate
//! root. Together they tie an entry to a stored directory record.

use valacc_core::{BlockHeight, ChainId, DirectoryRecord, Receipt, Sha256Hash};
use valacc_store::{RecordStore, Store, StoreError};

use crate::error::Result;

/// Proof that an entry is committed to a block's directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockProof {
    pub height: BlockHeight,
    pub chain_id: ChainId,
    /// Hash of the leaf record holding the entry.
    pub leaf_hash: Sha256Hash,
    /// Hash of the directory record for the block.
    pub directory_hash: Sha256Hash,
    /// Entry to chain root.
    pub entry: Receipt,
    /// Chain root to aggregate root.
    pub chain: Receipt,
}

impl BlockProof {
    /// Build a proof from stored records.
    ///
    /// `accumulator_id` names the directory chain that sealed the entry's
    /// chain. Returns `None` if the entry, its leaf or the matching directory
    /// record is not stored.
    pub async fn build<S: Store + ?Sized>(
        store: &S,
        accumulator_id: &ChainId,
        chain_id: &ChainId,
        entry: &Sha256Hash,
    ) -> Result<Option<BlockProof>> {
        let Some(leaf_hash) = store.entry_record_hash(chain_id, entry).await? else {
            return Ok(None);
        };
        let leaf = load(store, leaf_hash).await?;

        let Some(directory_hash) = store.directory_at_height(accumulator_id, leaf.height).await?
        else {
            return Ok(None);
        };
        let directory = load(store, directory_hash).await?;

        let Some(entry_receipt) = Receipt::build(&leaf.entries, *entry) else {
            return Ok(None);
        };
        // Two chains can close to the same root, so the slot is found by chain id.
        let Some(slot) = directory
            .chain_roots
            .iter()
            .position(|pair| pair.chain_id == *chain_id && pair.root == leaf.root)
        else {
            return Ok(None);
        };
        let roots: Vec<Sha256Hash> = directory.chain_roots.iter().map(|pair| pair.root).collect();
        let Some(chain_receipt) = Receipt::build_at(&roots, slot) else {
            return Ok(None);
        };

        Ok(Some(BlockProof {
            height: leaf.height,
            chain_id: *chain_id,
            leaf_hash,
            directory_hash,
            entry: entry_receipt,
            chain: chain_receipt,
        }))
    }

    /// Check both receipts and that they join up.
    pub fn validate(&self) -> bool {
        self.entry.validate() && self.chain.validate() && self.entry.root == self.chain.subject
    }

    /// Check the proof against a directory record obtained independently.
    ///
    /// Also requires the directory to list `chain_id` with the proven root.
    pub fn validate_against(&self, directory: &DirectoryRecord) -> bool {
        let Ok(hash) = directory.hash() else {
            return false;
        };
        let listed = directory.chain_roots.iter().any(|pair| {
            pair.chain_id == self.chain_id && pair.root == self.chain.subject
        });
        self.validate()
            && listed
            && hash == self.directory_hash
            && directory.root == self.chain.root
    }

    /// The entry this proof is for.
    pub fn subject(&self) -> Sha256Hash {
        self.entry.subject
    }
}

async fn load<S: Store + ?Sized>(store: &S, hash: Sha256Hash) -> Result<DirectoryRecord> {
    Ok(store
        .get_record(&hash)
        .await?
        .ok_or(StoreError::MissingRecord(hash))?)
}
