//! The block accumulator: ingest, dedup and block sealing.
//!
//! A [`BlockAccumulator`] owns one [`ChainAccumulator`] per chain touched in
//! the open block. Sealing closes every chain, persists a leaf record per
//! chain, folds the chain roots (sorted by chain id) into an aggregate root
//! and writes the block's directory record.
//!
//! [`BlockAccumulator::spawn`] moves the accumulator onto a tokio task with
//! two inputs, a bounded entry queue and a single-slot control signal. The
//! control signal always wins when both are ready.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use valacc_core::{
    BlockHeight, ChainAccumulator, ChainId, ChainRoot, DirectoryRecord, EntryHash, Sha256Hash,
};
use valacc_store::{RecordStore, Store};

use crate::config::AccumulatorConfig;
use crate::error::{AccumulatorError, Result};
use crate::stats::{AccumulatorStats, StatsSnapshot};

/// Sealed blocks that may wait unread before the worker stalls.
const ROOT_FEED_CAPACITY: usize = 16;

/// Outcome of sealing one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlock {
    pub height: BlockHeight,
    /// Hash of the directory record.
    pub record_hash: Sha256Hash,
    /// Aggregate root over the block's chain roots. `None` for an empty block.
    pub root: Option<Sha256Hash>,
    /// SHA-256 of the record hash followed by the stored root.
    pub anchor: Sha256Hash,
    /// Chain roots in directory order.
    pub chains: Vec<ChainRoot>,
    /// Entries committed in the block.
    pub entries: u64,
    /// Leaf records that could not be persisted.
    pub leaf_failures: usize,
}

/// A chain that has received entries in the open block.
#[derive(Debug)]
struct OpenChain {
    acc: ChainAccumulator,
    seen: HashSet<Sha256Hash>,
    sub_chain_ids: Vec<ChainId>,
}

impl OpenChain {
    fn new(capacity: usize) -> Self {
        Self {
            acc: ChainAccumulator::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            sub_chain_ids: Vec::new(),
        }
    }

    fn push(&mut self, entry: EntryHash) {
        self.acc.append(entry.entry_hash);
        self.seen.insert(entry.entry_hash);
        for sub in entry.sub_chain_ids {
            if !self.sub_chain_ids.contains(&sub) {
                self.sub_chain_ids.push(sub);
            }
        }
    }
}

/// Accumulates entries per chain and seals them into blocks.
pub struct BlockAccumulator<S> {
    store: Arc<S>,
    config: AccumulatorConfig,
    /// Height the next sealed block will get.
    height: BlockHeight,
    /// Hash of the last directory record written.
    previous: Option<Sha256Hash>,
    chains: HashMap<ChainId, OpenChain>,
    /// Directory chain ids that entries may not use.
    reserved: HashSet<ChainId>,
    stats: Arc<AccumulatorStats>,
}

impl<S: Store + 'static> BlockAccumulator<S> {
    /// Open an accumulator, resuming after the last directory record it
    /// wrote to `store`.
    pub async fn open(store: Arc<S>, config: AccumulatorConfig) -> Result<Self> {
        if config.entry_queue_capacity == 0 {
            return Err(AccumulatorError::InvalidConfig(
                "entry_queue_capacity must be at least 1".into(),
            ));
        }

        let (height, previous) = match store.head_record(&config.accumulator_id).await? {
            Some((hash, record)) => {
                if !record.is_directory {
                    return Err(AccumulatorError::InvalidConfig(format!(
                        "head of {} is a leaf record, not a directory record",
                        config.accumulator_id
                    )));
                }
                (record.height.saturating_add(1), Some(hash))
            }
            None => (0, None),
        };

        info!(
            accumulator = %config.accumulator_id,
            height,
            resumed = previous.is_some(),
            "opened block accumulator"
        );

        let mut reserved: HashSet<ChainId> = config.reserved_chain_ids.iter().copied().collect();
        reserved.insert(config.accumulator_id);

        Ok(Self {
            store,
            config,
            height,
            previous,
            chains: HashMap::new(),
            reserved,
            stats: Arc::new(AccumulatorStats::default()),
        })
    }

    pub fn accumulator_id(&self) -> ChainId {
        self.config.accumulator_id
    }

    /// Height the next sealed block will get.
    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Hash of the last directory record written, if any.
    pub fn previous(&self) -> Option<Sha256Hash> {
        self.previous
    }

    /// The open accumulator for a chain in the current block.
    pub fn chain(&self, chain_id: &ChainId) -> Option<&ChainAccumulator> {
        self.chains.get(chain_id).map(|open| &open.acc)
    }

    /// Number of chains touched in the open block.
    pub fn open_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Add an entry to the open block.
    ///
    /// The first entry of a chain in a block is always accepted. Later
    /// entries are dropped if already seen in this block or already committed
    /// to the chain by an earlier block. Entries on a directory chain id are
    /// rejected. Returns whether the entry was added.
    pub async fn accept(&mut self, entry: EntryHash) -> bool {
        if self.reserved.contains(&entry.chain_id) {
            warn!(
                accumulator = %self.config.accumulator_id,
                chain = %entry.chain_id,
                "entry names a directory chain, rejected"
            );
            self.stats.record_rejected();
            return false;
        }

        let open = match self.chains.entry(entry.chain_id) {
            Entry::Vacant(slot) => {
                debug!(chain = %entry.chain_id, "opening chain for block");
                self.stats.record_chain();
                self.stats.record_entry();
                slot.insert(OpenChain::new(self.config.initial_chain_capacity))
                    .push(entry);
                return true;
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        if open.seen.contains(&entry.entry_hash) {
            self.stats.record_duplicate();
            return false;
        }

        match self
            .store
            .entry_record_hash(&entry.chain_id, &entry.entry_hash)
            .await
        {
            Ok(Some(record)) => {
                debug!(
                    chain = %entry.chain_id,
                    entry = %entry.entry_hash,
                    record = %record,
                    "entry already committed"
                );
                open.seen.insert(entry.entry_hash);
                self.stats.record_duplicate();
                return false;
            }
            Ok(None) => {}
            Err(e) => warn!(
                chain = %entry.chain_id,
                entry = %entry.entry_hash,
                error = %e,
                "entry index lookup failed, accepting entry"
            ),
        }

        open.push(entry);
        self.stats.record_entry();
        true
    }

    /// Seal the open block.
    ///
    /// Leaf records are written concurrently and all of them finish before
    /// this returns. A failed leaf is logged and counted; a failed directory
    /// record is returned as an error and the block is not advanced.
    pub async fn seal(&mut self) -> Result<SealedBlock> {
        let height = self.height;
        let timestamp = now_nanos();
        let chains = std::mem::take(&mut self.chains);

        let mut roots = Vec::with_capacity(chains.len());
        let mut entries = 0u64;
        let mut leaves = JoinSet::new();

        for (chain_id, open) in chains {
            let Some(root) = open.acc.close() else {
                continue;
            };
            entries += open.acc.len() as u64;
            roots.push(ChainRoot { chain_id, root });
            leaves.spawn(persist_leaf(
                self.store.clone(),
                height,
                timestamp,
                chain_id,
                open.sub_chain_ids,
                root,
                open.acc.into_history(),
            ));
        }

        roots.sort_by_key(|pair| pair.chain_id);
        let root = ChainAccumulator::from_entries(roots.iter().map(|pair| &pair.root)).close();

        let record = DirectoryRecord::directory(
            height,
            timestamp,
            self.config.accumulator_id,
            self.previous,
            root.unwrap_or(Sha256Hash::ZERO),
            roots,
        );
        let stored = self.store.put_record(&record).await;

        // Barrier: no new block starts while leaf writes are in flight.
        let mut leaf_failures = 0;
        while let Some(joined) = leaves.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => leaf_failures += 1,
                Err(e) => {
                    error!(error = %e, "leaf persistence task failed");
                    leaf_failures += 1;
                }
            }
        }

        let record_hash = match stored {
            Ok(hash) => hash,
            Err(e) => {
                error!(
                    accumulator = %self.config.accumulator_id,
                    height,
                    error = %e,
                    "failed to write directory record"
                );
                return Err(e.into());
            }
        };
        let anchor = record.anchor_root()?;

        self.previous = Some(record_hash);
        self.height = height.saturating_add(1);
        self.stats.record_seal(record.chain_roots.len() as u64);

        info!(
            accumulator = %self.config.accumulator_id,
            height,
            chains = record.chain_roots.len(),
            entries,
            leaf_failures,
            root = ?root,
            "sealed block"
        );

        Ok(SealedBlock {
            height,
            record_hash,
            root,
            anchor,
            chains: record.chain_roots,
            entries,
            leaf_failures,
        })
    }

    /// Move the accumulator onto a tokio task.
    pub fn spawn(self) -> AccumulatorHandle {
        let accumulator_id = self.config.accumulator_id;
        let stats = self.stats.clone();
        let (entry_tx, entry_rx) = mpsc::channel(self.config.entry_queue_capacity);
        let (control_tx, control_rx) = mpsc::channel(1);
        let (feed_tx, feed_rx) = mpsc::channel(ROOT_FEED_CAPACITY);

        let task = tokio::spawn(self.run(entry_rx, control_rx, feed_tx));

        AccumulatorHandle {
            accumulator_id,
            entries: entry_tx,
            control: control_tx,
            feed: Mutex::new(feed_rx),
            stats,
            task,
        }
    }

    async fn run(
        mut self,
        mut entries: mpsc::Receiver<EntryHash>,
        mut control: mpsc::Receiver<bool>,
        feed: mpsc::Sender<Result<SealedBlock>>,
    ) {
        loop {
            tokio::select! {
                biased;

                signal = control.recv() => match signal {
                    Some(true) => {
                        self.drain(&mut entries).await;
                        let sealed = self.seal().await;
                        let failed = sealed.is_err();
                        if feed.send(sealed).await.is_err() {
                            debug!(accumulator = %self.config.accumulator_id, "root feed closed");
                        }
                        if failed {
                            break;
                        }
                    }
                    Some(false) => {}
                    None => break,
                },

                entry = entries.recv() => match entry {
                    Some(entry) => {
                        self.accept(entry).await;
                    }
                    None => break,
                },
            }
        }

        debug!(
            accumulator = %self.config.accumulator_id,
            unsealed_chains = self.chains.len(),
            "accumulator stopped"
        );
    }

    /// Pull entries that were already queued when the seal was requested.
    async fn drain(&mut self, entries: &mut mpsc::Receiver<EntryHash>) {
        for _ in 0..self.config.entry_queue_capacity {
            match entries.try_recv() {
                Ok(entry) => {
                    self.accept(entry).await;
                }
                Err(_) => break,
            }
        }
    }
}

/// Write one chain's leaf record. Returns whether it was stored.
async fn persist_leaf<S: Store>(
    store: Arc<S>,
    height: BlockHeight,
    timestamp: i64,
    chain_id: ChainId,
    sub_chain_ids: Vec<ChainId>,
    root: Sha256Hash,
    entries: Vec<Sha256Hash>,
) -> bool {
    let (sequence, previous) = match store.head_record(&chain_id).await {
        Ok(Some((hash, head))) => (head.sequence.saturating_add(1), Some(hash)),
        Ok(None) => (0, None),
        Err(e) => {
            error!(chain = %chain_id, height, error = %e, "failed to read chain head, leaf skipped");
            return false;
        }
    };

    let record = DirectoryRecord::leaf(
        height,
        sequence,
        timestamp,
        chain_id,
        sub_chain_ids,
        previous,
        root,
        entries,
    );
    match store.put_record(&record).await {
        Ok(_) => true,
        Err(e) => {
            error!(chain = %chain_id, height, sequence, error = %e, "failed to write leaf record");
            false
        }
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(nanos_since_epoch)
        .unwrap_or(0)
}

/// Saturates at `i64::MAX` (the year 2262).
fn nanos_since_epoch(elapsed: Duration) -> i64 {
    i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX)
}

/// Handle to a running accumulator.
pub struct AccumulatorHandle {
    accumulator_id: ChainId,
    entries: mpsc::Sender<EntryHash>,
    control: mpsc::Sender<bool>,
    feed: Mutex<mpsc::Receiver<Result<SealedBlock>>>,
    stats: Arc<AccumulatorStats>,
    task: JoinHandle<()>,
}

impl AccumulatorHandle {
    pub fn accumulator_id(&self) -> ChainId {
        self.accumulator_id
    }

    fn stopped(&self) -> AccumulatorError {
        AccumulatorError::Stopped(self.accumulator_id.to_string())
    }

    /// Queue an entry, waiting for space if the queue is full.
    pub async fn ingest(&self, entry: EntryHash) -> Result<()> {
        self.entries.send(entry).await.map_err(|_| self.stopped())
    }

    /// Queue an entry without waiting.
    pub fn try_ingest(&self, entry: EntryHash) -> Result<()> {
        self.entries.try_send(entry).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AccumulatorError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => self.stopped(),
        })
    }

    /// Send a control signal. `true` requests a seal; `false` only waits for
    /// the control slot to be free.
    pub async fn signal(&self, seal: bool) -> Result<()> {
        self.control.send(seal).await.map_err(|_| self.stopped())
    }

    /// Request a seal and wait for its result.
    ///
    /// Returns the next block on the root feed, so a block sealed by an
    /// earlier unread `signal(true)` is returned first.
    pub async fn seal(&self) -> Result<SealedBlock> {
        let mut feed = self.feed.lock().await;
        self.signal(true).await?;
        feed.recv().await.ok_or_else(|| self.stopped())?
    }

    /// Wait for the next sealed block. `None` once the worker has stopped.
    pub async fn next_sealed(&self) -> Option<Result<SealedBlock>> {
        self.feed.lock().await.recv().await
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the worker task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the worker. Entries of the open block are discarded.
    pub async fn shutdown(self) -> Result<()> {
        let AccumulatorHandle {
            entries,
            control,
            feed,
            task,
            ..
        } = self;
        drop(entries);
        drop(control);
        drop(feed);
        task.await
            .map_err(|e| AccumulatorError::TaskJoin(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valacc_store::MemoryStore;

    fn entry(chain: &str, name: &str) -> EntryHash {
        EntryHash::new(ChainId::derive(chain), Sha256Hash::digest(name.as_bytes()))
    }

    async fn open_memory() -> BlockAccumulator<MemoryStore> {
        BlockAccumulator::open(Arc::new(MemoryStore::new()), AccumulatorConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_entry_per_chain_accepted() {
        let mut acc = open_memory().await;
        assert!(acc.accept(entry("C", "E1")).await);
        assert!(acc.accept(entry("D", "E1")).await);
        assert_eq!(acc.open_chains(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_in_block_dropped() {
        let mut acc = open_memory().await;
        assert!(acc.accept(entry("C", "E1")).await);
        assert!(!acc.accept(entry("C", "E1")).await);
        assert!(acc.accept(entry("C", "E2")).await);
        assert!(!acc.accept(entry("C", "E2")).await);

        assert_eq!(acc.chain(&ChainId::derive("C")).unwrap().len(), 2);
        let stats = acc.stats();
        assert_eq!(stats.entries_total, 2);
        assert_eq!(stats.duplicates_total, 2);
    }

    #[tokio::test]
    async fn test_seal_advances_height() {
        let mut acc = open_memory().await;
        acc.accept(entry("C", "E1")).await;

        let first = acc.seal().await.unwrap();
        assert_eq!(first.height, 0);
        assert_eq!(first.entries, 1);
        assert_eq!(acc.height(), 1);
        assert_eq!(acc.previous(), Some(first.record_hash));
        assert_eq!(acc.open_chains(), 0);

        let second = acc.seal().await.unwrap();
        assert_eq!(second.height, 1);
        assert_eq!(second.root, None);
        assert!(second.chains.is_empty());
    }

    #[tokio::test]
    async fn test_sub_chains_collected_once() {
        let mut acc = open_memory().await;
        let sub = ChainId::derive("sub");
        acc.accept(entry("C", "E1").with_sub_chains(vec![sub])).await;
        acc.accept(entry("C", "E2").with_sub_chains(vec![sub, ChainId::derive("other")])).await;
        assert_eq!(acc.chains[&ChainId::derive("C")].sub_chain_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_initial_chain_capacity_is_reserved() {
        let config = AccumulatorConfig::default().with_initial_chain_capacity(64);
        let mut acc = BlockAccumulator::open(Arc::new(MemoryStore::new()), config)
            .await
            .unwrap();
        acc.accept(entry("C", "E1")).await;
        assert!(acc.chains[&ChainId::derive("C")].seen.capacity() >= 64);
    }

    #[tokio::test]
    async fn test_directory_chain_ids_rejected() {
        let other = AccumulatorConfig::accumulator_id_for(1);
        let config = AccumulatorConfig::default().with_reserved_chain_ids(vec![other]);
        let mut acc = BlockAccumulator::open(Arc::new(MemoryStore::new()), config)
            .await
            .unwrap();

        let own = acc.accumulator_id();
        assert!(!acc.accept(EntryHash::new(own, Sha256Hash::digest(b"E1"))).await);
        assert!(!acc.accept(EntryHash::new(other, Sha256Hash::digest(b"E1"))).await);
        assert_eq!(acc.open_chains(), 0);
        assert_eq!(acc.stats().rejected_total, 2);
        assert_eq!(acc.stats().entries_total, 0);
    }

    #[test]
    fn test_timestamp_saturates() {
        assert_eq!(nanos_since_epoch(Duration::from_secs(2)), 2_000_000_000);
        assert_eq!(nanos_since_epoch(Duration::MAX), i64::MAX);
    }

    #[tokio::test]
    async fn test_zero_queue_capacity_rejected() {
        let config = AccumulatorConfig::default().with_entry_queue_capacity(0);
        let result = BlockAccumulator::open(Arc::new(MemoryStore::new()), config).await;
        assert!(matches!(result, Err(AccumulatorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_handle_seal_includes_queued_entries() {
        let handle = open_memory().await.spawn();
        for i in 0..100 {
            handle.ingest(entry("C", &format!("E{i}"))).await.unwrap();
        }
        let sealed = handle.seal().await.unwrap();
        assert_eq!(sealed.entries, 100);
        assert_eq!(handle.stats().blocks_sealed, 1);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_false_signal_is_noop() {
        let handle = open_memory().await.spawn();
        handle.signal(false).await.unwrap();
        handle.signal(false).await.unwrap();
        handle.ingest(entry("C", "E1")).await.unwrap();
        let sealed = handle.seal().await.unwrap();
        assert_eq!(sealed.height, 0);
        assert_eq!(sealed.entries, 1);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_try_ingest_and_shutdown() {
        let handle = open_memory().await.spawn();
        handle.try_ingest(entry("C", "E1")).unwrap();
        let sealed = handle.seal().await.unwrap();
        assert_eq!(sealed.entries, 1);
        assert!(!handle.is_finished());
        handle.shutdown().await.unwrap();
    }
}
