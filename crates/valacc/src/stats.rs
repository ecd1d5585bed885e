//! Throughput counters.
//!
//! Counters are shared between an accumulator's worker and any number of
//! readers. Reads are relaxed snapshots; a report taken mid-seal may mix
//! values from before and after the seal.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one accumulator.
#[derive(Debug, Default)]
pub struct AccumulatorStats {
    entries_total: AtomicU64,
    duplicates_total: AtomicU64,
    rejected_total: AtomicU64,
    entries_open: AtomicU64,
    entries_last_block: AtomicU64,
    chains_last_block: AtomicU64,
    chains_total: AtomicU64,
    blocks_sealed: AtomicU64,
}

impl AccumulatorStats {
    pub(crate) fn record_entry(&self) {
        self.entries_total.fetch_add(1, Ordering::Relaxed);
        self.entries_open.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_chain(&self) {
        self.chains_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_seal(&self, chains: u64) {
        let entries = self.entries_open.swap(0, Ordering::Relaxed);
        self.entries_last_block.store(entries, Ordering::Relaxed);
        self.chains_last_block.store(chains, Ordering::Relaxed);
        self.blocks_sealed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            entries_total: self.entries_total.load(Ordering::Relaxed),
            duplicates_total: self.duplicates_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            entries_open: self.entries_open.load(Ordering::Relaxed),
            entries_last_block: self.entries_last_block.load(Ordering::Relaxed),
            chains_last_block: self.chains_last_block.load(Ordering::Relaxed),
            chains_total: self.chains_total.load(Ordering::Relaxed),
            blocks_sealed: self.blocks_sealed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AccumulatorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Entries accepted since start.
    pub entries_total: u64,
    /// Entries dropped as duplicates since start.
    pub duplicates_total: u64,
    /// Entries refused because they named a directory chain.
    pub rejected_total: u64,
    /// Entries accepted into the block that is still open.
    pub entries_open: u64,
    /// Entries in the most recently sealed block.
    pub entries_last_block: u64,
    /// Chains in the most recently sealed block.
    pub chains_last_block: u64,
    /// Chain openings since start, counted once per chain per block.
    pub chains_total: u64,
    pub blocks_sealed: u64,
}

impl std::ops::Add for StatsSnapshot {
    type Output = StatsSnapshot;

    fn add(self, other: StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            entries_total: self.entries_total + other.entries_total,
            duplicates_total: self.duplicates_total + other.duplicates_total,
            rejected_total: self.rejected_total + other.rejected_total,
            entries_open: self.entries_open + other.entries_open,
            entries_last_block: self.entries_last_block + other.entries_last_block,
            chains_last_block: self.chains_last_block + other.chains_last_block,
            chains_total: self.chains_total + other.chains_total,
            blocks_sealed: self.blocks_sealed + other.blocks_sealed,
        }
    }
}

impl std::iter::Sum for StatsSnapshot {
    fn sum<I: Iterator<Item = StatsSnapshot>>(iter: I) -> StatsSnapshot {
        iter.fold(StatsSnapshot::default(), |acc, s| acc + s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_rolls_open_counters() {
        let stats = AccumulatorStats::default();
        stats.record_chain();
        stats.record_entry();
        stats.record_entry();
        stats.record_duplicate();
        stats.record_seal(1);
        stats.record_entry();

        let snap = stats.snapshot();
        assert_eq!(snap.entries_total, 3);
        assert_eq!(snap.entries_last_block, 2);
        assert_eq!(snap.entries_open, 1);
        assert_eq!(snap.duplicates_total, 1);
        assert_eq!(snap.chains_last_block, 1);
        assert_eq!(snap.blocks_sealed, 1);
    }

    #[test]
    fn test_snapshot_sum() {
        let a = StatsSnapshot { entries_total: 2, blocks_sealed: 1, ..Default::default() };
        let b = StatsSnapshot { entries_total: 5, blocks_sealed: 1, ..Default::default() };
        let total: StatsSnapshot = [a, b].into_iter().sum();
        assert_eq!(total.entries_total, 7);
        assert_eq!(total.blocks_sealed, 2);
    }
}
