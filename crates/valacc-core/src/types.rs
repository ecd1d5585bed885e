//! Strong type definitions for the validator accumulator.
//!
//! Identifiers are newtypes to prevent mixing a chain id with an entry hash.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Sha256Hash;

/// A 32-byte chain identifier.
///
/// Chains are logical append-only sequences of entries. Ordering of chain ids
/// is byte-wise, which fixes the order chain roots enter a directory block.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub [u8; 32]);

impl ChainId {
    /// Derive a chain id from a name: SHA-256 of its UTF-8 bytes.
    pub fn derive(name: &str) -> Self {
        Self(Sha256Hash::digest(name.as_bytes()).0)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The top 16 bits, used to shard chains across accumulators.
    pub fn shard_prefix(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Sha256Hash::from_hex(s).map(|h| Self(h.0))
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for ChainId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ChainId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Sha256Hash> for ChainId {
    fn from(hash: Sha256Hash) -> Self {
        Self(hash.0)
    }
}

/// Height of a block in an accumulator's directory chain.
pub type BlockHeight = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_derive_is_sha256_of_name() {
        let id = ChainId::derive("C");
        assert_eq!(id.0, Sha256Hash::digest(b"C").0);
        assert_ne!(id, ChainId::derive("D"));
    }

    #[test]
    fn test_chain_id_ordering_is_bytewise() {
        let low = ChainId::from_bytes([0x01; 32]);
        let mut high_bytes = [0x01; 32];
        high_bytes[31] = 0x02;
        let high = ChainId::from_bytes(high_bytes);
        assert!(low < high);
    }

    #[test]
    fn test_shard_prefix() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x12;
        bytes[1] = 0x34;
        assert_eq!(ChainId::from_bytes(bytes).shard_prefix(), 0x1234);
    }

    #[test]
    fn test_chain_id_display() {
        let id = ChainId::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", id), "abababababababab");
        assert!(format!("{:?}", id).starts_with("ChainId("));
    }
}
