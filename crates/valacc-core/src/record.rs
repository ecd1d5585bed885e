//! Directory and leaf records.
//!
//! One binary layout serves both record kinds. All integers are big-endian:
//!
//! ```text
//! version        u8
//! height         u32
//! sequence       u32
//! timestamp      i64   nanoseconds since the Unix epoch
//! chain_id       [u8; 32]
//! sub_chains     u16 count, then count x [u8; 32]
//! previous       [u8; 32]   all zero when there is no previous record
//! is_directory   u8   0 or 1
//! root           [u8; 32]
//! chain_roots    u32 count, then count x ([u8; 32] chain id, [u8; 32] root)
//! entries        u32 count, then count x [u8; 32]
//! ```
//!
//! The record hash is SHA-256 over exactly these bytes and is never stored
//! inside the record.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::crypto::Sha256Hash;
use crate::error::{CoreError, Result};
use crate::types::{BlockHeight, ChainId};

/// Layout version written by this crate.
pub const RECORD_VERSION: u8 = 1;

/// Bytes in a record with no sub-chains, chain roots or entries.
pub const FIXED_LEN: usize = 1 + 4 + 4 + 8 + 32 + 2 + 32 + 1 + 32 + 4 + 4;

/// A chain's closed root as listed in a directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainRoot {
    pub chain_id: ChainId,
    pub root: Sha256Hash,
}

/// A sealed record: either a block's directory record or one chain's leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub version: u8,
    pub height: BlockHeight,
    /// Position of this record in its chain's record log.
    pub sequence: u32,
    /// Creation time in nanoseconds.
    pub timestamp: i64,
    pub chain_id: ChainId,
    pub sub_chain_ids: Vec<ChainId>,
    /// Hash of the prior record for `chain_id`.
    pub previous: Option<Sha256Hash>,
    pub is_directory: bool,
    /// Aggregate root for a directory record, chain root for a leaf.
    pub root: Sha256Hash,
    /// Sorted chain roots (directory records only).
    pub chain_roots: Vec<ChainRoot>,
    /// Raw entry hashes in arrival order (leaf records only).
    pub entries: Vec<Sha256Hash>,
}

impl DirectoryRecord {
    /// Build a leaf record committing to one chain's entries for a block.
    #[allow(clippy::too_many_arguments)]
    pub fn leaf(
        height: BlockHeight,
        sequence: u32,
        timestamp: i64,
        chain_id: ChainId,
        sub_chain_ids: Vec<ChainId>,
        previous: Option<Sha256Hash>,
        root: Sha256Hash,
        entries: Vec<Sha256Hash>,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            height,
            sequence,
            timestamp,
            chain_id,
            sub_chain_ids,
            previous,
            is_directory: false,
            root,
            chain_roots: Vec::new(),
            entries,
        }
    }

    /// Build a directory record for a sealed block.
    ///
    /// The sequence of a directory record is its height.
    pub fn directory(
        height: BlockHeight,
        timestamp: i64,
        chain_id: ChainId,
        previous: Option<Sha256Hash>,
        root: Sha256Hash,
        chain_roots: Vec<ChainRoot>,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            height,
            sequence: height,
            timestamp,
            chain_id,
            sub_chain_ids: Vec::new(),
            previous,
            is_directory: true,
            root,
            chain_roots,
            entries: Vec::new(),
        }
    }

    /// Length of [`encode`](Self::encode)'s output.
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN
            + self.sub_chain_ids.len() * 32
            + self.chain_roots.len() * 64
            + self.entries.len() * 32
    }

    /// Encode to the binary layout.
    ///
    /// Fails only if a list is too long for its count field.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let sub_chains = u16::try_from(self.sub_chain_ids.len()).map_err(|_| CoreError::TooMany {
            field: "sub_chain_ids",
            count: self.sub_chain_ids.len(),
        })?;
        let chain_roots = u32::try_from(self.chain_roots.len()).map_err(|_| CoreError::TooMany {
            field: "chain_roots",
            count: self.chain_roots.len(),
        })?;
        let entries = u32::try_from(self.entries.len()).map_err(|_| CoreError::TooMany {
            field: "entries",
            count: self.entries.len(),
        })?;

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.put_u8(self.version);
        buf.put_u32(self.height);
        buf.put_u32(self.sequence);
        buf.put_i64(self.timestamp);
        buf.put_slice(self.chain_id.as_bytes());
        buf.put_u16(sub_chains);
        for id in &self.sub_chain_ids {
            buf.put_slice(id.as_bytes());
        }
        buf.put_slice(self.previous.unwrap_or(Sha256Hash::ZERO).as_bytes());
        buf.put_u8(u8::from(self.is_directory));
        buf.put_slice(self.root.as_bytes());
        buf.put_u32(chain_roots);
        for pair in &self.chain_roots {
            buf.put_slice(pair.chain_id.as_bytes());
            buf.put_slice(pair.root.as_bytes());
        }
        buf.put_u32(entries);
        for entry in &self.entries {
            buf.put_slice(entry.as_bytes());
        }
        Ok(buf)
    }

    /// Decode a record from the front of `data`.
    ///
    /// Returns the record and the number of bytes consumed. Trailing bytes
    /// are left for the caller.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut reader = Reader { buf: data };

        let version = reader.u8("version")?;
        if version != RECORD_VERSION {
            return Err(CoreError::UnsupportedVersion(version));
        }
        let height = reader.u32("height")?;
        let sequence = reader.u32("sequence")?;
        let timestamp = reader.i64("timestamp")?;
        let chain_id = ChainId(reader.hash("chain_id")?.0);

        let count = reader.u16("sub_chain_count")? as usize;
        reader.need("sub_chain_ids", count * 32)?;
        let mut sub_chain_ids = Vec::with_capacity(count);
        for _ in 0..count {
            sub_chain_ids.push(ChainId(reader.hash("sub_chain_ids")?.0));
        }

        let previous = reader.hash("previous")?;
        let previous = (!previous.is_zero()).then_some(previous);

        let is_directory = match reader.u8("is_directory")? {
            0 => false,
            1 => true,
            other => return Err(CoreError::InvalidFlag(other)),
        };
        let root = reader.hash("root")?;

        let count = reader.u32("chain_root_count")? as usize;
        reader.need("chain_roots", count.saturating_mul(64))?;
        let mut chain_roots = Vec::with_capacity(count);
        for _ in 0..count {
            let chain_id = ChainId(reader.hash("chain_roots")?.0);
            let root = reader.hash("chain_roots")?;
            chain_roots.push(ChainRoot { chain_id, root });
        }

        let count = reader.u32("entry_count")? as usize;
        reader.need("entries", count.saturating_mul(32))?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(reader.hash("entries")?);
        }

        let record = Self {
            version,
            height,
            sequence,
            timestamp,
            chain_id,
            sub_chain_ids,
            previous,
            is_directory,
            root,
            chain_roots,
            entries,
        };
        Ok((record, data.len() - reader.buf.len()))
    }

    /// SHA-256 of the encoded record.
    pub fn hash(&self) -> Result<Sha256Hash> {
        Ok(Sha256Hash::digest(&self.encode()?))
    }

    /// SHA-256 of the record hash followed by the root.
    ///
    /// This is the value published downstream for a sealed block.
    pub fn anchor_root(&self) -> Result<Sha256Hash> {
        let mut buf = Vec::with_capacity(64);
        buf.put_slice(self.hash()?.as_bytes());
        buf.put_slice(self.root.as_bytes());
        Ok(Sha256Hash::digest(&buf))
    }
}

/// Bounds-checked cursor over an encoded record.
struct Reader<'a> {
    buf: &'a [u8],
}

impl Reader<'_> {
    fn need(&self, field: &'static str, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(CoreError::Truncated {
                field,
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn u8(&mut self, field: &'static str) -> Result<u8> {
        self.need(field, 1)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self, field: &'static str) -> Result<u16> {
        self.need(field, 2)?;
        Ok(self.buf.get_u16())
    }

    fn u32(&mut self, field: &'static str) -> Result<u32> {
        self.need(field, 4)?;
        Ok(self.buf.get_u32())
    }

    fn i64(&mut self, field: &'static str) -> Result<i64> {
        self.need(field, 8)?;
        Ok(self.buf.get_i64())
    }

    fn hash(&mut self, field: &'static str) -> Result<Sha256Hash> {
        self.need(field, 32)?;
        let mut out = [0u8; 32];
        self.buf.copy_to_slice(&mut out);
        Ok(Sha256Hash(out))
    }
}
