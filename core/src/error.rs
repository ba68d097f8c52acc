//! Error types for the shielded core.
//!
//! Boundary input problems are reported as [`ValidationError`] before any
//! cryptographic work happens. Everything else surfaces as [`Error`].
//! Proof verification never errors: it is a plain `bool`.
use thiserror::Error;

use crate::note::Nullifier;

/// Malformed or mis-sized input rejected at the boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is missing the `0x` prefix
    #[error("{field}: missing 0x prefix")]
    MissingPrefix { field: &'static str },

    /// Wrong number of hex digits after the prefix
    #[error("{field}: expected {expected} hex digits, got {got}")]
    Length {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// A character outside `[0-9a-fA-F]`
    #[error("{field}: invalid hex digit")]
    InvalidHex { field: &'static str },

    /// 32 bytes that do not encode an element of the scalar field
    #[error("{field}: not a canonical field element")]
    NonCanonical { field: &'static str },

    /// Concatenated commitment blob does not hold exactly `count` tokens
    #[error("commitment blob: expected {expected} characters for {count} tokens, got {got}")]
    BlobLength {
        count: usize,
        expected: usize,
        got: usize,
    },

    /// Leaf count outside what the tree can hold
    #[error("commitment count {count} out of range 0..={max}")]
    CountOutOfRange { count: usize, max: u64 },

    /// Proof blob that cannot be decoded at all
    #[error("proof blob: {0}")]
    MalformedProof(&'static str),
}

/// Errors raised by the tree, the protocols and the proof oracles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Append beyond `2^depth` leaves
    #[error("tree capacity of {capacity} leaves exceeded")]
    CapacityExceeded { capacity: u64 },

    /// Tree depth outside the supported range
    #[error("invalid tree depth {depth}, must be between 1 and {max}")]
    InvalidDepth { depth: usize, max: usize },

    /// Path requested before the witness saw its own leaf
    #[error("witness has not observed its leaf yet")]
    WitnessNotStarted,

    /// Replay requested for a position the log does not hold
    #[error("no leaf at position {position} (tree holds {size})")]
    UnknownPosition { position: u64, size: u64 },

    /// Persisted tree state that violates the frontier invariants
    #[error("corrupt tree state: {0}")]
    CorruptState(&'static str),

    /// Value conservation would overflow a u64
    #[error("value overflow: {0} + {1}")]
    ValueOverflow(u64, u64),

    /// Redeeming more than the note holds
    #[error("value underflow: {0} - {1}")]
    ValueUnderflow(u64, u64),

    /// The private witness does not satisfy the relation
    #[error("relation unsatisfied")]
    Unsatisfied,

    /// Public inputs and private witness belong to different relations
    #[error("public inputs and witness are for different relations")]
    RelationMismatch,

    /// The note's nullifier is already in the spent set
    #[error("nullifier {0} already spent")]
    NullifierSpent(Nullifier),

    /// A deposit over an old note the pool has already shielded against
    #[error("deposit for nullifier {0} already accepted")]
    DuplicateDeposit(Nullifier),

    /// A transaction whose proof does not check out
    #[error("proof rejected")]
    VerificationFailed,

    /// Root that the ledger never produced (or has already forgotten)
    #[error("unknown merkle root")]
    UnknownRoot,

    /// Note could not be sealed to the given public key
    #[error("note encryption failed")]
    EncryptionFailed,

    /// Encrypted note that does not open under the given key
    #[error("encrypted note does not open")]
    DecryptionFailed,

    /// Proving backend failure (keys, serialization, synthesis)
    #[error("proving backend: {0}")]
    Backend(String),
}

/// Result type for the shielded core
pub type Result<T> = std::result::Result<T, Error>;
