//! Router: shards entries across block accumulators and drives block seals.
//!
//! A chain is owned by exactly one accumulator, chosen from the top 16 bits
//! of its id. Every accumulator shares the same store.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use valacc_core::{ChainId, EntryHash, Sha256Hash};
use valacc_store::Store;

use crate::accumulator::{AccumulatorHandle, BlockAccumulator, SealedBlock};
use crate::config::{AccumulatorConfig, RouterConfig};
use crate::error::{AccumulatorError, Result};
use crate::proof::BlockProof;
use crate::stats::StatsSnapshot;

/// Result of sealing one block on every shard.
#[derive(Debug, Clone)]
pub struct BlockReport {
    /// One sealed block per shard, in shard order.
    pub blocks: Vec<SealedBlock>,
    /// Entries committed across all shards in this round.
    pub entries: u64,
    /// Chains sealed across all shards in this round.
    pub chains: u64,
    /// Time since the previous report (or since start).
    pub elapsed: Duration,
}

impl BlockReport {
    /// Entries per second over `elapsed`.
    pub fn entries_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.entries as f64 / secs
        }
    }
}

/// Fans entries out to a fixed set of block accumulators.
pub struct Router<S> {
    store: Arc<S>,
    config: RouterConfig,
    shards: Vec<AccumulatorHandle>,
    last_report: tokio::sync::Mutex<Instant>,
}

impl<S: Store + 'static> Router<S> {
    /// Open and spawn `config.shards` accumulators over one store.
    ///
    /// Shard `i` uses the accumulator id `SHA-256("Accumulator i")`.
    pub async fn start(store: Arc<S>, config: RouterConfig) -> Result<Self> {
        if config.shards == 0 || config.shards > usize::from(u16::MAX) + 1 {
            return Err(AccumulatorError::InvalidConfig(format!(
                "shard count must be between 1 and 65536, got {}",
                config.shards
            )));
        }

        let directory_ids: Vec<ChainId> = (0..config.shards)
            .map(AccumulatorConfig::accumulator_id_for)
            .collect();

        let mut shards = Vec::with_capacity(config.shards);
        for id in &directory_ids {
            let mut reserved = config.accumulator.reserved_chain_ids.clone();
            reserved.extend(directory_ids.iter().filter(|other| *other != id));
            let shard_config = config
                .accumulator
                .clone()
                .with_accumulator_id(*id)
                .with_reserved_chain_ids(reserved);
            let acc = BlockAccumulator::open(store.clone(), shard_config).await?;
            shards.push(acc.spawn());
        }

        info!(shards = config.shards, "router started");
        Ok(Self {
            store,
            config,
            shards,
            last_report: tokio::sync::Mutex::new(Instant::now()),
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `chain_id`.
    pub fn shard_for(&self, chain_id: &ChainId) -> usize {
        usize::from(chain_id.shard_prefix()) % self.shards.len()
    }

    /// The accumulator that owns an entry's chain.
    pub fn route(&self, entry: &EntryHash) -> &AccumulatorHandle {
        &self.shards[self.shard_for(&entry.chain_id)]
    }

    pub fn shard(&self, index: usize) -> Option<&AccumulatorHandle> {
        self.shards.get(index)
    }

    /// Queue an entry on its shard, waiting if that shard's queue is full.
    pub async fn ingest(&self, entry: EntryHash) -> Result<()> {
        self.route(&entry).ingest(entry).await
    }

    /// Seal a block on every shard and wait for all of them.
    pub async fn seal_all(&self) -> Result<BlockReport> {
        let mut last_report = self.last_report.lock().await;

        for shard in &self.shards {
            shard.signal(true).await?;
        }

        let mut blocks = Vec::with_capacity(self.shards.len());
        for shard in &self.shards {
            let sealed = shard.next_sealed().await.ok_or_else(|| {
                AccumulatorError::Stopped(shard.accumulator_id().to_string())
            })??;
            blocks.push(sealed);
        }

        let now = Instant::now();
        let elapsed = now.duration_since(*last_report);
        *last_report = now;

        Ok(BlockReport {
            entries: blocks.iter().map(|b| b.entries).sum(),
            chains: blocks.iter().map(|b| b.chains.len() as u64).sum(),
            blocks,
            elapsed,
        })
    }

    /// Seal blocks every `config.block_interval` until `shutdown` completes.
    ///
    /// A seal error stops the timer and is returned.
    pub async fn run_block_timer(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.block_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => return Ok(()),
                _ = ticker.tick() => {
                    let report = match self.seal_all().await {
                        Ok(report) => report,
                        Err(e) => {
                            warn!(error = %e, "block seal failed, stopping timer");
                            return Err(e);
                        }
                    };
                    let stats = self.stats();
                    info!(
                        height = report.blocks.first().map(|b| b.height),
                        entries = report.entries,
                        chains = report.chains,
                        entries_per_second = report.entries_per_second() as u64,
                        entries_total = stats.entries_total,
                        chains_total = stats.chains_total,
                        "block sealed on all shards"
                    );
                }
            }
        }
    }

    /// Counters summed over every shard.
    pub fn stats(&self) -> StatsSnapshot {
        self.shards.iter().map(AccumulatorHandle::stats).sum()
    }

    /// Prove that `entry` is committed on `chain_id`.
    pub async fn prove(
        &self,
        chain_id: &ChainId,
        entry: &Sha256Hash,
    ) -> Result<Option<BlockProof>> {
        let owner = self.shards[self.shard_for(chain_id)].accumulator_id();
        BlockProof::build(self.store.as_ref(), &owner, chain_id, entry).await
    }

    /// Stop every shard. Unsealed entries are discarded.
    pub async fn shutdown(self) -> Result<()> {
        for shard in self.shards {
            shard.shutdown().await?;
        }
        Ok(())
    }
}
