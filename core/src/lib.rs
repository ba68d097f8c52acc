//! Shielded value transfer core
//!
//! Notes are committed with Poseidon over BN254, shielding commitments are
//! accumulated in an incremental Merkle tree, and the deposit, withdraw,
//! convert and redeem protocols assemble the inputs handed to a [`ProofOracle`].

pub mod boundary;
pub mod codec;
pub mod delivery;
pub mod error;
pub mod merkle;
pub mod note;
pub mod oracle;
pub mod pool;
pub mod poseidon;
pub mod protocol;

pub use delivery::{EncryptedNote, RecipientKeys};
pub use error::{Error, Result, ValidationError};
pub use merkle::{IncrementalTree, IncrementalWitness, MerklePath, TREE_DEPTH};
pub use note::{Commitment, Note, NoteHeader, Nullifier, RecipientKeyHash, ShieldingNote};
pub use oracle::{MockOracle, Proof, ProofOracle, PublicInputs, Relation, VerificationKey};
pub use pool::CommitmentPool;
pub use protocol::{MemoryNullifierSet, NullifierSet};
