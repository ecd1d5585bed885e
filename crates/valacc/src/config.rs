//! Configuration for accumulators and the router.

use std::time::Duration;

use valacc_core::ChainId;

/// Default capacity of an accumulator's entry queue.
pub const DEFAULT_ENTRY_QUEUE_CAPACITY: usize = 10_000;

/// Default time between block seals when driven by the router's timer.
pub const DEFAULT_BLOCK_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for one block accumulator.
#[derive(Debug, Clone)]
pub struct AccumulatorConfig {
    /// Chain id of the accumulator's directory chain.
    pub accumulator_id: ChainId,
    /// Entries that may wait in the queue before `ingest` blocks.
    pub entry_queue_capacity: usize,
    /// History capacity reserved for each chain opened in a block.
    pub initial_chain_capacity: usize,
    /// Other accumulators' directory chain ids sharing the store. Entries on
    /// these, or on `accumulator_id`, are rejected.
    pub reserved_chain_ids: Vec<ChainId>,
}

impl AccumulatorConfig {
    /// Identity of the accumulator at `index` in a router.
    pub fn accumulator_id_for(index: usize) -> ChainId {
        ChainId::derive(&format!("Accumulator {index}"))
    }

    pub fn with_accumulator_id(mut self, accumulator_id: ChainId) -> Self {
        self.accumulator_id = accumulator_id;
        self
    }

    pub fn with_entry_queue_capacity(mut self, capacity: usize) -> Self {
        self.entry_queue_capacity = capacity;
        self
    }

    pub fn with_initial_chain_capacity(mut self, capacity: usize) -> Self {
        self.initial_chain_capacity = capacity;
        self
    }

    pub fn with_reserved_chain_ids(mut self, ids: Vec<ChainId>) -> Self {
        self.reserved_chain_ids = ids;
        self
    }
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            accumulator_id: Self::accumulator_id_for(0),
            entry_queue_capacity: DEFAULT_ENTRY_QUEUE_CAPACITY,
            initial_chain_capacity: 16,
            reserved_chain_ids: Vec::new(),
        }
    }
}

/// Configuration for the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Number of accumulators entries are sharded across.
    pub shards: usize,
    /// Period of the block timer.
    pub block_interval: Duration,
    /// Template for every shard. The accumulator id is replaced per shard.
    pub accumulator: AccumulatorConfig,
}

impl RouterConfig {
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    pub fn with_block_interval(mut self, interval: Duration) -> Self {
        self.block_interval = interval;
        self
    }

    pub fn with_accumulator(mut self, accumulator: AccumulatorConfig) -> Self {
        self.accumulator = accumulator;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            shards: 4,
            block_interval: DEFAULT_BLOCK_INTERVAL,
            accumulator: AccumulatorConfig::default(),
        }
    }
}
