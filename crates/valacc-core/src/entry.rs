//! The unit of ingest.

use serde::{Deserialize, Serialize};

use crate::crypto::Sha256Hash;
use crate::types::ChainId;

/// An entry hash submitted for inclusion under a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryHash {
    pub chain_id: ChainId,
    pub entry_hash: Sha256Hash,
    /// Sub-chains the entry also belongs to. Carried into the leaf record.
    pub sub_chain_ids: Vec<ChainId>,
}

impl EntryHash {
    pub fn new(chain_id: ChainId, entry_hash: Sha256Hash) -> Self {
        Self {
            chain_id,
            entry_hash,
            sub_chain_ids: Vec::new(),
        }
    }

    pub fn with_sub_chains(mut self, sub_chain_ids: Vec<ChainId>) -> Self {
        self.sub_chain_ids = sub_chain_ids;
        self
    }
}
