//! Key layouts for each bucket.
//!
//! Hash-keyed buckets use the raw 32 bytes. Composite keys concatenate their
//! parts; integers are big-endian so keys sort by height.

use valacc_core::{BlockHeight, ChainId, Sha256Hash};

/// Key for [`Bucket::Node`](crate::Bucket::Node) and
/// [`Bucket::NodeNext`](crate::Bucket::NodeNext).
pub fn record(hash: &Sha256Hash) -> [u8; 32] {
    hash.0
}

/// Key for [`Bucket::NodeHead`](crate::Bucket::NodeHead) and
/// [`Bucket::NodeFirst`](crate::Bucket::NodeFirst).
pub fn chain(chain_id: &ChainId) -> [u8; 32] {
    chain_id.0
}

/// Key for [`Bucket::EntryNode`](crate::Bucket::EntryNode).
pub fn entry(chain_id: &ChainId, entry: &Sha256Hash) -> [u8; 64] {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(chain_id.as_bytes());
    key[32..].copy_from_slice(entry.as_bytes());
    key
}

/// Key for [`Bucket::DirectoryBlockHeight`](crate::Bucket::DirectoryBlockHeight).
pub fn height(chain_id: &ChainId, height: BlockHeight) -> [u8; 36] {
    let mut key = [0u8; 36];
    key[..32].copy_from_slice(chain_id.as_bytes());
    key[32..].copy_from_slice(&height.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_keys_sort_by_height() {
        let chain = ChainId::derive("Accumulator 0");
        let mut keys: Vec<_> = [300u32, 2, 70_000, 0].iter().map(|h| height(&chain, *h)).collect();
        keys.sort();
        let heights: Vec<u32> = keys
            .iter()
            .map(|k| u32::from_be_bytes([k[32], k[33], k[34], k[35]]))
            .collect();
        assert_eq!(heights, vec![0, 2, 300, 70_000]);
    }

    #[test]
    fn test_entry_key_scoped_by_chain() {
        let entry_hash = Sha256Hash::digest(b"E1");
        assert_ne!(
            entry(&ChainId::derive("A"), &entry_hash),
            entry(&ChainId::derive("B"), &entry_hash)
        );
    }
}
