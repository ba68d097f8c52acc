//! Groth16 proving backend for the zktx relations
//!
//! [`Groth16Oracle`] implements [`zktx_core::ProofOracle`] over BN254 with
//! the circuits in [`circuit`]; [`Backend`] picks between it and the mock
//! oracle from configuration.

pub mod backend;
pub mod circuit;
pub mod error;
pub mod groth16;

pub use backend::Backend;
pub use circuit::{BalanceCircuit, DepositCircuit, WithdrawCircuit};
pub use error::{ProverError, Result};
pub use groth16::{CircuitKeys, Groth16Oracle, KeyPaths};
