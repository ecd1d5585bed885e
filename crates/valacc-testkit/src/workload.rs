//! Seeded synthetic entry streams.
//!
//! Stands in for a set of validators submitting entries across many chains.
//! Independent validators resubmit entries they have already seen, so a
//! workload can mix in duplicates of earlier entries at a fixed rate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use valacc_core::{ChainId, EntryHash, Sha256Hash};

/// A reproducible stream of entries.
#[derive(Debug, Clone)]
pub struct Workload {
    rng: StdRng,
    chains: Vec<ChainId>,
    duplicate_rate: f64,
    sent: Vec<EntryHash>,
}

impl Workload {
    /// Entries spread uniformly over `chains` chains (at least one).
    pub fn new(seed: u64, chains: usize) -> Self {
        let chains = (0..chains.max(1))
            .map(|i| ChainId::derive(&format!("workload chain {i}")))
            .collect();
        Self {
            rng: StdRng::seed_from_u64(seed),
            chains,
            duplicate_rate: 0.0,
            sent: Vec::new(),
        }
    }

    /// Fraction of entries, in `[0, 1]`, that repeat an earlier entry.
    pub fn with_duplicate_rate(mut self, rate: f64) -> Self {
        self.duplicate_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn chains(&self) -> &[ChainId] {
        &self.chains
    }

    /// Distinct entries produced so far.
    pub fn unique_sent(&self) -> usize {
        self.sent.len()
    }

    /// Produce the next entry.
    pub fn next_entry(&mut self) -> EntryHash {
        if !self.sent.is_empty() && self.rng.gen_bool(self.duplicate_rate) {
            let index = self.rng.gen_range(0..self.sent.len());
            return self.sent[index].clone();
        }

        let chain_id = self.chains[self.rng.gen_range(0..self.chains.len())];
        let entry = EntryHash::new(chain_id, Sha256Hash(self.rng.gen()));
        self.sent.push(entry.clone());
        entry
    }

    /// Produce `n` entries.
    pub fn batch(&mut self, n: usize) -> Vec<EntryHash> {
        (0..n).map(|_| self.next_entry()).collect()
    }
}

impl Iterator for Workload {
    type Item = EntryHash;

    fn next(&mut self) -> Option<EntryHash> {
        Some(self.next_entry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_seed_same_stream() {
        let a = Workload::new(42, 10).batch(500);
        let b = Workload::new(42, 10).batch(500);
        assert_eq!(a, b);
        assert_ne!(a, Workload::new(43, 10).batch(500));
    }

    #[test]
    fn test_no_duplicates_by_default() {
        let batch = Workload::new(1, 3).batch(1_000);
        let unique: HashSet<_> = batch.iter().map(|e| (e.chain_id, e.entry_hash)).collect();
        assert_eq!(unique.len(), 1_000);
    }

    #[test]
    fn test_duplicates_repeat_earlier_entries() {
        let mut workload = Workload::new(7, 5).with_duplicate_rate(0.5);
        let batch = workload.batch(2_000);
        let unique: HashSet<_> = batch.iter().map(|e| (e.chain_id, e.entry_hash)).collect();
        assert_eq!(unique.len(), workload.unique_sent());
        assert!(unique.len() < 1_500, "expected duplicates, got {} unique", unique.len());
    }

    #[test]
    fn test_entries_stay_on_workload_chains() {
        let mut workload = Workload::new(9, 4);
        let chains: HashSet<ChainId> = workload.chains().iter().copied().collect();
        assert!(workload.by_ref().take(200).all(|e| chains.contains(&e.chain_id)));
    }
}
