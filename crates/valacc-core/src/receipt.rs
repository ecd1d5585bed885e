//! Receipts: compact proofs that an entry is committed to an accumulator root.
//!
//! A receipt lists, in order, every hash the subject was combined with on its
//! way to the root, and which side of the `combine` call that sibling sat on.
//! Replaying the combinations from the subject must reproduce the root.

use serde::{Deserialize, Serialize};

use crate::accumulator::insert;
use crate::crypto::Sha256Hash;
use crate::error::{CoreError, Result};

/// Which operand of [`Sha256Hash::combine`] the sibling supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The sibling is the left operand; the running value is on the right.
    Left,
    /// The sibling is the right operand; the running value is on the left.
    Right,
}

/// One combination step on the path from subject to root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptStep {
    /// The hash combined with the running value.
    pub sibling: Sha256Hash,
    /// Side of the combine call the sibling occupies.
    pub side: Side,
}

impl ReceiptStep {
    /// Apply this step to the running value.
    pub fn apply(&self, running: &Sha256Hash) -> Sha256Hash {
        match self.side {
            Side::Left => self.sibling.combine(running),
            Side::Right => running.combine(&self.sibling),
        }
    }
}

/// Proof that `subject` is included under `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The entry hash being proven.
    pub subject: Sha256Hash,
    /// Combination steps, subject first.
    pub path: Vec<ReceiptStep>,
    /// The accumulator root the path must reproduce.
    pub root: Sha256Hash,
}

impl Receipt {
    /// Build a receipt for the first occurrence of `subject` in `entries`.
    ///
    /// Returns `None` if `subject` does not occur.
    pub fn build(entries: &[Sha256Hash], subject: Sha256Hash) -> Option<Receipt> {
        let mut builder = ReceiptBuilder::new(subject);
        for entry in entries {
            builder.append(*entry);
        }
        builder.finish()
    }

    /// Build a receipt for the entry at `index`, which may repeat an earlier
    /// entry's value.
    ///
    /// Returns `None` if `index` is out of range.
    pub fn build_at(entries: &[Sha256Hash], index: usize) -> Option<Receipt> {
        let mut builder = ReceiptBuilder::new(*entries.get(index)?);
        for (i, entry) in entries.iter().enumerate() {
            builder.push(*entry, i == index);
        }
        builder.finish()
    }

    /// Check that replaying the path from the subject reproduces the root.
    pub fn validate(&self) -> bool {
        self.computed_root() == self.root
    }

    /// The root obtained by replaying the path.
    pub fn computed_root(&self) -> Sha256Hash {
        self.path
            .iter()
            .fold(self.subject, |running, step| step.apply(&running))
    }

    /// Encode to CBOR for transport to a verifier.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

/// Incremental receipt construction.
///
/// Runs the same insertion as [`ChainAccumulator`](crate::ChainAccumulator)
/// while following the subject through the carries. Entries can be fed as
/// they arrive; [`finish`](Self::finish) closes a copy of the edge.
#[derive(Debug, Clone)]
pub struct ReceiptBuilder {
    subject: Sha256Hash,
    edge: Vec<Option<Sha256Hash>>,
    /// Edge level currently holding the subject's accumulated value.
    level: Option<usize>,
    path: Vec<ReceiptStep>,
}

impl ReceiptBuilder {
    /// Start tracking `subject`.
    pub fn new(subject: Sha256Hash) -> Self {
        Self {
            subject,
            edge: Vec::new(),
            level: None,
            path: Vec::new(),
        }
    }

    /// Feed the next entry. The first entry equal to the subject is tracked.
    pub fn append(&mut self, hash: Sha256Hash) {
        let is_subject = hash == self.subject;
        self.push(hash, is_subject);
    }

    /// Feed the next entry, tracking it if `is_subject` and nothing is tracked yet.
    fn push(&mut self, hash: Sha256Hash, is_subject: bool) {
        let Some(level) = self.level else {
            if is_subject {
                self.level = Some(self.carry_from(0, hash));
            } else {
                insert(&mut self.edge, hash);
            }
            return;
        };

        // The subject is parked at `level`; an insertion only touches it if the
        // carry reaches that level.
        let reaches = self.edge[..level].iter().all(Option::is_some);
        if !reaches {
            insert(&mut self.edge, hash);
            return;
        }

        let mut hash = hash;
        for slot in &mut self.edge[..level] {
            if let Some(left) = slot.take() {
                hash = left.combine(&hash);
            }
        }
        if let Some(parked) = self.edge[level].take() {
            self.path.push(ReceiptStep {
                sibling: hash,
                side: Side::Right,
            });
            hash = parked.combine(&hash);
        }
        self.level = Some(self.carry_from(level + 1, hash));
    }

    /// Carry the subject's value upward from `start`, recording every left
    /// sibling it absorbs. Returns the level it comes to rest at.
    fn carry_from(&mut self, start: usize, mut hash: Sha256Hash) -> usize {
        let mut level = start;
        while level < self.edge.len() {
            match self.edge[level].take() {
                None => {
                    self.edge[level] = Some(hash);
                    return level;
                }
                Some(left) => {
                    self.path.push(ReceiptStep {
                        sibling: left,
                        side: Side::Left,
                    });
                    hash = left.combine(&hash);
                    level += 1;
                }
            }
        }
        self.edge.push(Some(hash));
        level
    }

    /// Close the tracked structure and return the receipt.
    ///
    /// Non-destructive; more entries may be appended afterwards. Returns
    /// `None` if the subject has not been appended.
    pub fn finish(&self) -> Option<Receipt> {
        let level = self.level?;
        let mut path = self.path.clone();
        let mut root: Option<Sha256Hash> = None;
        let mut in_root = false;

        for (i, slot) in self.edge.iter().enumerate() {
            let Some(occupant) = slot else {
                continue;
            };
            root = Some(match root {
                None => {
                    in_root = i == level;
                    *occupant
                }
                Some(running) => {
                    if i == level {
                        path.push(ReceiptStep {
                            sibling: running,
                            side: Side::Right,
                        });
                        in_root = true;
                    } else if in_root {
                        path.push(ReceiptStep {
                            sibling: *occupant,
                            side: Side::Left,
                        });
                    }
                    occupant.combine(&running)
                }
            });
        }

        Some(Receipt {
            subject: self.subject,
            path,
            root: root?,
        })
    }
}
