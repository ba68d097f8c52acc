use serde::{Deserialize, Serialize};

use super::hasher::{hash_pair, serde_hashes};
use crate::note::Commitment;

/// Membership path from a leaf to the root
///
/// `path_bits[l]` is `true` when the node at level `l` is a right child, so
/// its sibling `siblings[l]` sits on the left.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MerklePath {
    #[serde(with = "serde_hashes")]
    pub siblings: Vec<[u8; 32]>,
    pub path_bits: Vec<bool>,
}

impl MerklePath {
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Leaf index encoded by the orientation bits
    pub fn position(&self) -> u64 {
        self.path_bits
            .iter()
            .enumerate()
            .filter(|(_, is_right)| **is_right)
            .map(|(level, _)| 1u64 << level)
            .sum()
    }

    /// Fold the leaf up through the siblings
    pub fn root(&self, leaf: &Commitment) -> [u8; 32] {
        self.siblings
            .iter()
            .zip(&self.path_bits)
            .fold(leaf.0, |node, (sibling, is_right)| {
                if *is_right {
                    hash_pair(sibling, &node)
                } else {
                    hash_pair(&node, sibling)
                }
            })
    }

    pub fn verify(&self, leaf: &Commitment, root: &[u8; 32]) -> bool {
        self.siblings.len() == self.path_bits.len() && self.root(leaf) == *root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::empty_root;

    #[test]
    fn test_position_from_bits() {
        let path = MerklePath {
            siblings: vec![[0u8; 32]; 4],
            path_bits: vec![true, false, false, true],
        };
        assert_eq!(path.position(), 9);
        assert_eq!(path.depth(), 4);
    }

    #[test]
    fn test_single_leaf_path() {
        let leaf = Commitment([7u8; 32]);
        let path = MerklePath {
            siblings: vec![empty_root(0), empty_root(1)],
            path_bits: vec![false, false],
        };
        let expected = hash_pair(&hash_pair(&leaf.0, &empty_root(0)), &empty_root(1));
        assert!(path.verify(&leaf, &expected));
        assert!(!path.verify(&Commitment([8u8; 32]), &expected));
    }

    #[test]
    fn test_mismatched_lengths_never_verify() {
        let leaf = Commitment([7u8; 32]);
        let path = MerklePath {
            siblings: vec![empty_root(0)],
            path_bits: vec![false, false],
        };
        let root = path.root(&leaf);
        assert!(!path.verify(&leaf, &root));
    }

    #[test]
    fn test_path_serde() {
        let path = MerklePath {
            siblings: vec![[3u8; 32], [4u8; 32]],
            path_bits: vec![true, false],
        };
        let json = serde_json::to_string(&path).unwrap();
        let back: MerklePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
