//! SHA-256 hashing and the Merkle combine rule.
//!
//! Every interior node of a chain accumulator is produced by [`Sha256Hash::combine`],
//! which hashes each operand on its own before hashing the concatenation:
//!
//! ```text
//! combine(l, r) = SHA-256( SHA-256(l) || SHA-256(r) )
//! ```
//!
//! Roots produced by other implementations of the accumulator only match if
//! this rule is reproduced bit for bit.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of data.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Combine `self` (left) with `right`.
    pub fn combine(&self, right: &Sha256Hash) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(Sha256::digest(self.0));
        hasher.update(Sha256::digest(right.0));
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Check for the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The zero hash (sentinel for "no previous record").
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Sha256Hash {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_matches_known_vector() {
        // SHA-256("abc")
        let h = Sha256Hash::digest(b"abc");
        assert_eq!(
            h.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_combine_prehashes_both_operands() {
        let left = Sha256Hash::digest(b"left");
        let right = Sha256Hash::digest(b"right");

        let mut manual = Vec::with_capacity(64);
        manual.extend_from_slice(Sha256Hash::digest(&left.0).as_bytes());
        manual.extend_from_slice(Sha256Hash::digest(&right.0).as_bytes());
        assert_eq!(left.combine(&right), Sha256Hash::digest(&manual));

        // Not the plain concatenation hash.
        let mut plain = Vec::with_capacity(64);
        plain.extend_from_slice(&left.0);
        plain.extend_from_slice(&right.0);
        assert_ne!(left.combine(&right), Sha256Hash::digest(&plain));
    }

    #[test]
    fn test_combine_is_order_sensitive() {
        let a = Sha256Hash::digest(b"a");
        let b = Sha256Hash::digest(b"b");
        assert_ne!(a.combine(&b), b.combine(&a));
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = Sha256Hash::digest(b"roundtrip");
        assert_eq!(Sha256Hash::from_hex(&h.to_hex()).unwrap(), h);
        assert!(Sha256Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_zero_sentinel() {
        assert!(Sha256Hash::ZERO.is_zero());
        assert!(!Sha256Hash::digest(b"").is_zero());
    }
}
