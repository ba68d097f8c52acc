//! Append-only commitment tree
//!
//! ```text
//!                root
//!              /      \
//!           n(1,0)    n(1,1)
//!           /   \      /   \
//!         L0    L1   L2   (empty)
//! ```
//!
//! The tree keeps only its frontier (one node per level), so memory is
//! O(depth) no matter how many leaves were appended. Witnesses carry their
//! own copy of the frontier taken at creation time and advance on their own.

mod frontier;
mod hasher;
mod path;
mod tree;
mod witness;

pub use frontier::Frontier;
pub use hasher::{EMPTY_LEAF, MAX_DEPTH, TREE_DEPTH, empty_root, hash_pair};
pub use path::MerklePath;
pub use tree::IncrementalTree;
pub use witness::IncrementalWitness;
