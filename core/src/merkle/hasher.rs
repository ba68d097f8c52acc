use std::sync::LazyLock;

use crate::poseidon::{fr_from_bytes, fr_to_bytes, hash_fields};

/// Default tree depth (65,536 leaves)
pub const TREE_DEPTH: usize = 16;

/// Deepest tree supported; positions must fit in a `u64` capacity
pub const MAX_DEPTH: usize = 32;

/// Value of an unoccupied leaf
pub const EMPTY_LEAF: [u8; 32] = [0u8; 32];

/// `EMPTY_ROOTS[l]` is the root of a subtree of height `l` with no leaves
static EMPTY_ROOTS: LazyLock<Vec<[u8; 32]>> = LazyLock::new(|| {
    let mut roots = Vec::with_capacity(MAX_DEPTH + 1);
    roots.push(EMPTY_LEAF);
    for level in 0..MAX_DEPTH {
        let below = roots[level];
        roots.push(hash_pair(&below, &below));
    }
    roots
});

/// Poseidon(left, right)
pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    fr_to_bytes(&hash_fields(&[fr_from_bytes(left), fr_from_bytes(right)]))
}

/// Root of an empty subtree of the given height. Panics above [`MAX_DEPTH`].
pub fn empty_root(level: usize) -> [u8; 32] {
    EMPTY_ROOTS[level]
}

/// Hex (de)serialization for lists of node hashes
pub(crate) mod serde_hashes {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(hashes: &[[u8; 32]], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(hashes.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<[u8; 32]>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| {
                let mut out = [0u8; 32];
                hex::decode_to_slice(s, &mut out).map_err(D::Error::custom)?;
                Ok(out)
            })
            .collect()
    }
}
