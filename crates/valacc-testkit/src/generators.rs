//! Proptest generators for property-based testing.

use proptest::prelude::*;

use valacc_core::{ChainId, ChainRoot, DirectoryRecord, EntryHash, Sha256Hash};

/// Generate a random hash.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash)
}

/// Generate a random chain id.
pub fn chain_id() -> impl Strategy<Value = ChainId> {
    any::<[u8; 32]>().prop_map(ChainId::from_bytes)
}

/// Generate a list of distinct hashes in random order.
pub fn distinct_hashes(
    len: impl Into<prop::collection::SizeRange>,
) -> impl Strategy<Value = Vec<Sha256Hash>> {
    prop::collection::hash_set(any::<[u8; 32]>(), len)
        .prop_map(|set| set.into_iter().map(Sha256Hash).collect::<Vec<_>>())
        .prop_shuffle()
}

/// Generate an entry on one of `chains` chains named `chain 0..chains`.
pub fn entry_on(chains: u32) -> impl Strategy<Value = EntryHash> {
    (0..chains.max(1), sha256_hash()).prop_map(|(chain, hash)| {
        EntryHash::new(ChainId::derive(&format!("chain {chain}")), hash)
    })
}

/// Generate a previous-record link. The zero hash is reserved for "none".
pub fn previous() -> impl Strategy<Value = Option<Sha256Hash>> {
    prop::option::of(sha256_hash().prop_filter("zero is the none sentinel", |h| !h.is_zero()))
}

/// Generate a leaf record.
pub fn leaf_record() -> impl Strategy<Value = DirectoryRecord> {
    (
        any::<u32>(),
        any::<u32>(),
        any::<i64>(),
        chain_id(),
        prop::collection::vec(chain_id(), 0..4),
        previous(),
        sha256_hash(),
        prop::collection::vec(sha256_hash(), 0..16),
    )
        .prop_map(
            |(height, sequence, timestamp, chain, subs, previous, root, entries)| {
                DirectoryRecord::leaf(height, sequence, timestamp, chain, subs, previous, root, entries)
            },
        )
}

/// Generate a directory record with sorted chain roots.
pub fn directory_record() -> impl Strategy<Value = DirectoryRecord> {
    (
        any::<u32>(),
        any::<i64>(),
        chain_id(),
        previous(),
        sha256_hash(),
        prop::collection::vec((chain_id(), sha256_hash()), 0..8),
    )
        .prop_map(|(height, timestamp, chain, previous, root, pairs)| {
            let mut chain_roots: Vec<ChainRoot> = pairs
                .into_iter()
                .map(|(chain_id, root)| ChainRoot { chain_id, root })
                .collect();
            chain_roots.sort_by_key(|pair| pair.chain_id);
            DirectoryRecord::directory(height, timestamp, chain, previous, root, chain_roots)
        })
}

/// Generate either kind of record.
pub fn any_record() -> impl Strategy<Value = DirectoryRecord> {
    prop_oneof![leaf_record(), directory_record()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use valacc_core::{ChainAccumulator, Receipt};

    proptest! {
        #[test]
        fn prop_record_roundtrip(record in any_record()) {
            let bytes = record.encode().unwrap();
            let (decoded, consumed) = DirectoryRecord::decode(&bytes).unwrap();
            prop_assert_eq!(consumed, bytes.len());
            prop_assert_eq!(decoded, record);
        }

        #[test]
        fn prop_every_receipt_validates(entries in distinct_hashes(1..300)) {
            let root = ChainAccumulator::from_entries(&entries).close();
            for (i, entry) in entries.iter().enumerate().step_by(7) {
                let receipt = Receipt::build(&entries, *entry).unwrap();
                prop_assert!(receipt.validate(), "entry {} of {}", i, entries.len());
                prop_assert_eq!(Some(receipt.root), root);
            }
        }

        #[test]
        fn prop_partial_closes_do_not_disturb(entries in distinct_hashes(1..200), every in 1usize..10) {
            let mut acc = ChainAccumulator::new();
            for (i, entry) in entries.iter().enumerate() {
                acc.append(*entry);
                if i % every == 0 {
                    acc.close();
                }
            }
            prop_assert_eq!(acc.close(), ChainAccumulator::from_entries(&entries).close());
        }

        #[test]
        fn prop_entry_on_stays_in_range(entry in entry_on(5)) {
            let ids: Vec<ChainId> = (0..5).map(|i| ChainId::derive(&format!("chain {i}"))).collect();
            prop_assert!(ids.contains(&entry.chain_id));
        }
    }
}
