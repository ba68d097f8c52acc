use serde::{Deserialize, Serialize};

use super::hasher::{MAX_DEPTH, empty_root, hash_pair, serde_hashes};
use crate::error::{Error, Result};
use crate::poseidon::fr_from_canonical;

/// Rightmost completed node at every level of a fixed-depth tree
///
/// `nodes[l]` is occupied exactly when bit `l` of `size` is set; it is the
/// root of the left subtree still waiting for its right sibling. `nodes[depth]`
/// holds the full root once the tree reaches capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FrontierState", into = "FrontierState")]
pub struct Frontier {
    depth: usize,
    size: u64,
    nodes: Vec<Option<[u8; 32]>>,
}

impl Frontier {
    /// Empty frontier. `depth` must already be validated.
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            depth,
            size: 0,
            nodes: vec![None; depth + 1],
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn is_full(&self) -> bool {
        self.size == self.capacity()
    }

    pub(crate) fn node(&self, level: usize) -> Option<[u8; 32]> {
        self.nodes.get(level).copied().flatten()
    }

    /// Insert the next leaf, returning its position
    pub fn append(&mut self, leaf: [u8; 32]) -> Result<u64> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        let position = self.size;
        let mut carry = leaf;
        let mut level = 0;

        // Every set bit of the position is a pending left sibling
        while level < self.depth && (position >> level) & 1 == 1 {
            let left = self.nodes[level].take().unwrap_or(empty_root(level));
            carry = hash_pair(&left, &carry);
            level += 1;
        }

        self.nodes[level] = Some(carry);
        self.size += 1;
        Ok(position)
    }

    /// Root of the tree with every unfilled slot set to the empty subtree
    pub fn root(&self) -> [u8; 32] {
        if let Some(root) = self.nodes[self.depth] {
            return root;
        }

        let mut node = empty_root(0);
        for level in 0..self.depth {
            node = if (self.size >> level) & 1 == 1 {
                let left = self.nodes[level].unwrap_or(empty_root(level));
                hash_pair(&left, &node)
            } else {
                hash_pair(&node, &empty_root(level))
            };
        }
        node
    }
}

/// Persisted form: only the occupied nodes, lowest level first
#[derive(Serialize, Deserialize)]
struct FrontierState {
    depth: usize,
    size: u64,
    #[serde(with = "serde_hashes")]
    nodes: Vec<[u8; 32]>,
}

impl From<Frontier> for FrontierState {
    fn from(frontier: Frontier) -> Self {
        Self {
            depth: frontier.depth,
            size: frontier.size,
            nodes: frontier.nodes.into_iter().flatten().collect(),
        }
    }
}

impl TryFrom<FrontierState> for Frontier {
    type Error = Error;

    fn try_from(state: FrontierState) -> Result<Self> {
        if state.depth == 0 || state.depth > MAX_DEPTH {
            return Err(Error::InvalidDepth {
                depth: state.depth,
                max: MAX_DEPTH,
            });
        }

        let mut frontier = Frontier::new(state.depth);
        if state.size > frontier.capacity() {
            return Err(Error::CorruptState("size exceeds capacity"));
        }
        frontier.size = state.size;

        let mut occupied: Vec<usize> = (0..state.depth)
            .filter(|level| (state.size >> level) & 1 == 1)
            .collect();
        if frontier.is_full() {
            occupied = vec![state.depth];
        }
        if occupied.len() != state.nodes.len() {
            return Err(Error::CorruptState("node count does not match size"));
        }

        for (level, node) in occupied.into_iter().zip(state.nodes) {
            if fr_from_canonical(&node).is_none() {
                return Err(Error::CorruptState("node is not a field element"));
            }
            frontier.nodes[level] = Some(node);
        }
        Ok(frontier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[0] = n;
        out
    }

    #[test]
    fn test_occupancy_follows_size_bits() {
        let mut frontier = Frontier::new(4);
        for n in 0..11u8 {
            frontier.append(leaf(n)).unwrap();
            for level in 0..4 {
                let bit = (frontier.size() >> level) & 1 == 1;
                assert_eq!(frontier.node(level).is_some(), bit);
            }
        }
    }

    #[test]
    fn test_root_of_two_leaves() {
        let mut frontier = Frontier::new(2);
        frontier.append(leaf(1)).unwrap();
        frontier.append(leaf(2)).unwrap();
        let expected = hash_pair(&hash_pair(&leaf(1), &leaf(2)), &empty_root(1));
        assert_eq!(frontier.root(), expected);
    }

    #[test]
    fn test_full_frontier() {
        let mut frontier = Frontier::new(1);
        frontier.append(leaf(1)).unwrap();
        frontier.append(leaf(2)).unwrap();
        assert!(frontier.is_full());
        assert_eq!(frontier.root(), hash_pair(&leaf(1), &leaf(2)));
        assert_eq!(
            frontier.append(leaf(3)),
            Err(Error::CapacityExceeded { capacity: 2 })
        );
    }

    #[test]
    fn test_state_rejects_wrong_node_count() {
        let state = FrontierState {
            depth: 4,
            size: 3,
            nodes: vec![leaf(1)],
        };
        assert!(matches!(
            Frontier::try_from(state),
            Err(Error::CorruptState(_))
        ));
    }

    #[test]
    fn test_state_rejects_bad_depth() {
        let state = FrontierState {
            depth: 0,
            size: 0,
            nodes: vec![],
        };
        assert_eq!(
            Frontier::try_from(state),
            Err(Error::InvalidDepth {
                depth: 0,
                max: MAX_DEPTH
            })
        );
    }
}
