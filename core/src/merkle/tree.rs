use log::debug;
use serde::{Deserialize, Serialize};

use super::frontier::Frontier;
use super::hasher::{MAX_DEPTH, TREE_DEPTH, empty_root};
use super::witness::IncrementalWitness;
use crate::error::{Error, Result};
use crate::note::Commitment;

fn check_depth(depth: usize) -> Result<()> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(Error::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(())
}

/// Incremental Merkle tree over note commitments
///
/// Roots depend only on the ordered leaf sequence. Appends must be
/// serialized with witness creation; see [`crate::pool::CommitmentPool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncrementalTree {
    frontier: Frontier,
}

impl IncrementalTree {
    /// Empty tree of the default depth
    pub fn new() -> Self {
        Self {
            frontier: Frontier::new(TREE_DEPTH),
        }
    }

    pub fn with_depth(depth: usize) -> Result<Self> {
        check_depth(depth)?;
        Ok(Self {
            frontier: Frontier::new(depth),
        })
    }

    /// Build a tree by appending `leaves` in order
    pub fn from_leaves<'a>(
        depth: usize,
        leaves: impl IntoIterator<Item = &'a Commitment>,
    ) -> Result<Self> {
        let mut tree = Self::with_depth(depth)?;
        for leaf in leaves {
            tree.append(*leaf)?;
        }
        Ok(tree)
    }

    /// Append a commitment, returning its leaf position
    pub fn append(&mut self, leaf: Commitment) -> Result<u64> {
        let position = self.frontier.append(leaf.0)?;
        debug!("Appended {leaf} at position {position}");
        Ok(position)
    }

    pub fn root(&self) -> [u8; 32] {
        self.frontier.root()
    }

    /// Root of this tree before any append
    pub fn empty_root(&self) -> [u8; 32] {
        empty_root(self.frontier.depth())
    }

    /// Root of every empty tree of `depth`
    pub fn empty_root_at(depth: usize) -> Result<[u8; 32]> {
        check_depth(depth)?;
        Ok(empty_root(depth))
    }

    pub fn size(&self) -> u64 {
        self.frontier.size()
    }

    pub fn depth(&self) -> usize {
        self.frontier.depth()
    }

    pub fn capacity(&self) -> u64 {
        self.frontier.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.frontier.is_full()
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Witness for the leaf at the current size
    ///
    /// The proven leaf is the first leaf appended to the witness.
    pub fn witness(&self) -> IncrementalWitness {
        IncrementalWitness::new(self.frontier.clone())
    }
}

impl Default for IncrementalTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::hash_pair;

    fn leaf(n: u8) -> Commitment {
        let mut out = [0u8; 32];
        out[0] = n;
        Commitment(out)
    }

    #[test]
    fn test_empty_tree() {
        let tree = IncrementalTree::new();
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.depth(), TREE_DEPTH);
        assert_eq!(tree.root(), tree.empty_root());
        assert_eq!(tree.root(), IncrementalTree::new().root());
    }

    #[test]
    fn test_empty_root_at_depth() {
        for depth in [1, 4, TREE_DEPTH, MAX_DEPTH] {
            let fresh = IncrementalTree::with_depth(depth).unwrap();
            assert_eq!(IncrementalTree::empty_root_at(depth), Ok(fresh.root()));
        }

        let mut tree = IncrementalTree::with_depth(4).unwrap();
        tree.append(leaf(1)).unwrap();
        assert_eq!(IncrementalTree::empty_root_at(4), Ok(tree.empty_root()));
        assert_ne!(tree.root(), tree.empty_root());

        assert_eq!(
            IncrementalTree::empty_root_at(0),
            Err(Error::InvalidDepth {
                depth: 0,
                max: MAX_DEPTH
            })
        );
        assert!(IncrementalTree::empty_root_at(MAX_DEPTH + 1).is_err());
    }

    #[test]
    fn test_append_positions() {
        let mut tree = IncrementalTree::with_depth(3).unwrap();
        for n in 0..5u8 {
            assert_eq!(tree.append(leaf(n)).unwrap(), n as u64);
        }
        assert_eq!(tree.size(), 5);
    }

    #[test]
    fn test_root_matches_manual_hashing() {
        let tree = IncrementalTree::from_leaves(2, &[leaf(1), leaf(2), leaf(3)]).unwrap();
        let left = hash_pair(&leaf(1).0, &leaf(2).0);
        let right = hash_pair(&leaf(3).0, &empty_root(0));
        assert_eq!(tree.root(), hash_pair(&left, &right));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut tree = IncrementalTree::with_depth(2).unwrap();
        for n in 0..4u8 {
            tree.append(leaf(n)).unwrap();
        }
        assert!(tree.is_full());
        assert_eq!(
            tree.append(leaf(9)),
            Err(Error::CapacityExceeded { capacity: 4 })
        );
    }

    #[test]
    fn test_invalid_depth() {
        assert!(IncrementalTree::with_depth(0).is_err());
        assert!(IncrementalTree::with_depth(MAX_DEPTH + 1).is_err());
        assert!(IncrementalTree::with_depth(MAX_DEPTH).is_ok());
    }

    #[test]
    fn test_serde_preserves_root() {
        let mut tree = IncrementalTree::with_depth(5).unwrap();
        for n in 0..13u8 {
            tree.append(leaf(n)).unwrap();
        }
        let json = serde_json::to_string(&tree).unwrap();
        let mut restored: IncrementalTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.root(), tree.root());

        tree.append(leaf(42)).unwrap();
        restored.append(leaf(42)).unwrap();
        assert_eq!(restored.root(), tree.root());
    }
}
