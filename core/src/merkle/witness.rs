use log::debug;
use serde::{Deserialize, Serialize};

use super::frontier::Frontier;
use super::hasher::{empty_root, serde_hashes};
use super::path::MerklePath;
use crate::error::{Error, Result};
use crate::note::Commitment;

/// Membership tracker for the leaf at `position()`
///
/// Starts from a snapshot of the tree frontier. Left siblings of the leaf are
/// already final in that snapshot; right siblings are built from the leaves
/// appended after it: `filled` holds the completed right subtrees (lowest
/// level first) and `cursor` the one still being filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalWitness {
    base: Frontier,
    leaf: Option<Commitment>,
    #[serde(with = "serde_hashes")]
    filled: Vec<[u8; 32]>,
    cursor: Option<Frontier>,
}

impl IncrementalWitness {
    pub(crate) fn new(base: Frontier) -> Self {
        Self {
            base,
            leaf: None,
            filled: Vec::new(),
            cursor: None,
        }
    }

    pub fn position(&self) -> u64 {
        self.base.size()
    }

    /// The proven leaf, once observed
    pub fn leaf(&self) -> Option<Commitment> {
        self.leaf
    }

    /// Observe the next leaf appended to the tree
    pub fn append(&mut self, leaf: Commitment) -> Result<()> {
        let capacity = self.base.capacity();

        if self.leaf.is_none() {
            if self.base.is_full() {
                return Err(Error::CapacityExceeded { capacity });
            }
            self.leaf = Some(leaf);
            return Ok(());
        }

        if let Some(cursor) = self.cursor.as_mut() {
            cursor.append(leaf.0)?;
            if cursor.is_full() {
                self.filled.push(cursor.root());
                self.cursor = None;
            }
            return Ok(());
        }

        match self.next_sibling_level() {
            None => Err(Error::CapacityExceeded { capacity }),
            Some(0) => {
                self.filled.push(leaf.0);
                Ok(())
            }
            Some(level) => {
                debug!(
                    "Witness {} opening level {level} sibling",
                    self.position()
                );
                let mut cursor = Frontier::new(level);
                cursor.append(leaf.0)?;
                self.cursor = Some(cursor);
                Ok(())
            }
        }
    }

    /// Level of the next right sibling that is not complete yet
    fn next_sibling_level(&self) -> Option<usize> {
        let position = self.position();
        (0..self.base.depth())
            .filter(|level| (position >> level) & 1 == 0)
            .nth(self.filled.len())
    }

    fn siblings(&self) -> MerklePath {
        let position = self.position();
        let depth = self.base.depth();
        let mut filled = self.filled.iter();
        let mut cursor = self.cursor.as_ref();

        let mut path = MerklePath {
            siblings: Vec::with_capacity(depth),
            path_bits: Vec::with_capacity(depth),
        };

        for level in 0..depth {
            let is_right = (position >> level) & 1 == 1;
            let sibling = if is_right {
                self.base.node(level).unwrap_or(empty_root(level))
            } else if let Some(node) = filled.next() {
                *node
            } else if let Some(partial) = cursor.take() {
                partial.root()
            } else {
                empty_root(level)
            };
            path.siblings.push(sibling);
            path.path_bits.push(is_right);
        }
        path
    }

    /// Path for the proven leaf against the current root
    pub fn path(&self) -> Result<MerklePath> {
        if self.leaf.is_none() {
            return Err(Error::WitnessNotStarted);
        }
        Ok(self.siblings())
    }

    /// Root implied by everything observed so far
    pub fn root(&self) -> [u8; 32] {
        match &self.leaf {
            Some(leaf) => self.siblings().root(leaf),
            None => self.base.root(),
        }
    }
}
