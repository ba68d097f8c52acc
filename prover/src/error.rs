//! Errors raised by the Groth16 backend.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProverError {
    /// Key file could not be read or written
    #[error("Key file {path}: {reason}")]
    KeyIo { path: String, reason: String },

    /// Key or proof bytes that do not deserialize
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Constraint synthesis or proving failed
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Withdraw circuit depth the commitment tree cannot have
    #[error("Invalid tree depth {depth}, must be between 1 and {max}")]
    InvalidDepth { depth: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ProverError>;

impl From<ProverError> for zktx_core::Error {
    fn from(err: ProverError) -> Self {
        zktx_core::Error::Backend(err.to_string())
    }
}

impl From<ark_serialize::SerializationError> for ProverError {
    fn from(err: ark_serialize::SerializationError) -> Self {
        ProverError::Serialization(err.to_string())
    }
}

impl From<ark_relations::r1cs::SynthesisError> for ProverError {
    fn from(err: ark_relations::r1cs::SynthesisError) -> Self {
        ProverError::Synthesis(err.to_string())
    }
}
