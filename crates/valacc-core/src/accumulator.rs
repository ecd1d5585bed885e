//! ChainAccumulator: the incremental Merkle structure for one chain.
//!
//! The accumulator keeps only the unresolved right edge of the tree. Slot `i`
//! of the edge holds the root of a complete subtree of `2^i` entries, so the
//! occupied slots spell out the entry count in binary. Appending works like
//! incrementing a binary counter: carries become `combine` calls.
//!
//! ```text
//! entries:  1      2      3      4      5
//! edge:     O      _O     OO     __O    O_O
//! ```

use crate::crypto::Sha256Hash;
use crate::receipt::{Receipt, ReceiptBuilder};

/// Incremental Merkle accumulator for a single chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainAccumulator {
    /// Unresolved right edge, level 0 first.
    edge: Vec<Option<Sha256Hash>>,
    /// Every entry appended, in arrival order.
    history: Vec<Sha256Hash>,
}

impl ChainAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edge: Vec::new(),
            history: Vec::with_capacity(capacity),
        }
    }

    /// Build an accumulator from a sequence of entries.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Sha256Hash>) -> Self {
        let mut acc = Self::new();
        for entry in entries {
            acc.append(*entry);
        }
        acc
    }

    /// Append an entry hash.
    pub fn append(&mut self, hash: Sha256Hash) {
        // Recorded before any combination so receipts can replay raw entries.
        self.history.push(hash);
        insert(&mut self.edge, hash);
    }

    /// Fold the edge into a root without modifying the accumulator.
    ///
    /// Returns `None` for an empty accumulator. When the entry count is a
    /// power of two only one slot is occupied and it is returned as is.
    pub fn close(&self) -> Option<Sha256Hash> {
        fold(&self.edge)
    }

    /// Build a receipt for `subject` over this accumulator's history.
    pub fn receipt(&self, subject: Sha256Hash) -> Option<Receipt> {
        let mut builder = ReceiptBuilder::new(subject);
        for entry in &self.history {
            builder.append(*entry);
        }
        builder.finish()
    }

    /// The unresolved right edge, level 0 first.
    pub fn edge(&self) -> &[Option<Sha256Hash>] {
        &self.edge
    }

    /// Every entry appended, in arrival order.
    pub fn history(&self) -> &[Sha256Hash] {
        &self.history
    }

    /// Consume the accumulator, returning its history.
    pub fn into_history(self) -> Vec<Sha256Hash> {
        self.history
    }

    /// Number of entries appended.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Check if no entries have been appended.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Render occupied (`O`) and empty (`_`) slots, low level first.
    pub fn edge_fingerprint(&self) -> String {
        self.edge
            .iter()
            .map(|slot| if slot.is_some() { 'O' } else { '_' })
            .collect()
    }
}

/// Insert at level 0, carrying combined hashes upward until a free slot is found.
pub(crate) fn insert(edge: &mut Vec<Option<Sha256Hash>>, mut hash: Sha256Hash) {
    for slot in edge.iter_mut() {
        match slot.take() {
            None => {
                *slot = Some(hash);
                return;
            }
            Some(left) => hash = left.combine(&hash),
        }
    }
    edge.push(Some(hash));
}

/// Fold occupied slots low to high: each occupant is the left operand, the
/// running root the right.
pub(crate) fn fold(edge: &[Option<Sha256Hash>]) -> Option<Sha256Hash> {
    edge.iter().flatten().fold(None, |root, occupant| match root {
        None => Some(*occupant),
        Some(root) => Some(occupant.combine(&root)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(seed: &[u8], n: usize) -> Vec<Sha256Hash> {
        let mut hash = Sha256Hash::digest(seed);
        (0..n)
            .map(|_| {
                hash = Sha256Hash::digest(&hash.0);
                hash
            })
            .collect()
    }

    #[test]
    fn test_empty_close_is_none() {
        let acc = ChainAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.close(), None);
        assert_eq!(acc.edge_fingerprint(), "");
    }

    #[test]
    fn test_single_entry_root_is_entry() {
        let entries = sequence(b"single", 1);
        let acc = ChainAccumulator::from_entries(&entries);
        assert_eq!(acc.close(), Some(entries[0]));
    }

    #[test]
    fn test_small_roots_match_manual_combination() {
        let e = sequence(b"manual", 5);

        let two = ChainAccumulator::from_entries(&e[..2]);
        assert_eq!(two.close(), Some(e[0].combine(&e[1])));

        let three = ChainAccumulator::from_entries(&e[..3]);
        assert_eq!(three.close(), Some(e[0].combine(&e[1]).combine(&e[2])));

        let four = ChainAccumulator::from_entries(&e[..4]);
        let expected = e[0].combine(&e[1]).combine(&e[2].combine(&e[3]));
        assert_eq!(four.close(), Some(expected));

        let five = ChainAccumulator::from_entries(&e[..5]);
        assert_eq!(five.close(), Some(expected.combine(&e[4])));
    }

    #[test]
    fn test_edge_slots_track_entry_count_bits() {
        let mut acc = ChainAccumulator::new();
        for (n, entry) in sequence(b"testdata", 65_000).into_iter().enumerate() {
            acc.append(entry);
            let count = n + 1;
            let bits = usize::BITS - count.leading_zeros();
            assert!(acc.edge().len() >= bits as usize);
            for (i, slot) in acc.edge().iter().enumerate() {
                let bit_set = (count >> i) & 1 == 1;
                assert_eq!(
                    slot.is_some(),
                    bit_set,
                    "slot {} wrong after {} entries, edge {}",
                    i,
                    count,
                    acc.edge_fingerprint()
                );
            }
        }
    }

    #[test]
    fn test_close_is_idempotent_and_non_destructive() {
        let mut acc = ChainAccumulator::new();
        for entry in sequence(b"idempotent", 13) {
            acc.append(entry);
        }
        let before = acc.clone();
        let first = acc.close();
        let second = acc.close();
        assert_eq!(first, second);
        assert_eq!(acc, before);
    }

    #[test]
    fn test_partial_closes_do_not_change_root() {
        let mut acc = ChainAccumulator::new();
        for entry in sequence(b"testdata", 2100) {
            acc.append(entry);
            let incremental = acc.close();
            let fresh = ChainAccumulator::from_entries(acc.history()).close();
            assert_eq!(incremental, fresh, "mismatch at {} entries", acc.len());
        }
    }

    #[test]
    fn test_single_bit_flip_changes_root() {
        let entries = sequence(b"testdata", 64);
        let root = ChainAccumulator::from_entries(&entries).close();

        for j in 0..entries.len() {
            for bit in 0..64 {
                let mut modified = entries.clone();
                modified[j].0[bit / 8] ^= 1 << (bit % 8);
                let modified_root = ChainAccumulator::from_entries(&modified).close();
                assert_ne!(root, modified_root, "flip of bit {} in entry {} undetected", bit, j);
            }
        }
    }

    #[test]
    fn test_fingerprint_low_level_first() {
        let acc = ChainAccumulator::from_entries(&sequence(b"fp", 6));
        assert_eq!(acc.edge_fingerprint(), "_OO");
    }
}
