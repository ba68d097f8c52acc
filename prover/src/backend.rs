//! Backend selection from configuration
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use zktx_config::{ProverMode, ZktxConfig};
use zktx_core::oracle::{
    MockOracle, PrivateWitness, Proof, ProofOracle, PublicInputs, Relation, VerificationKey,
};

use crate::groth16::Groth16Oracle;

/// The proof oracle a process runs with
pub enum Backend {
    Mock(MockOracle),
    Groth16(Box<Groth16Oracle>),
}

impl Backend {
    /// Build the backend named by `config.prover.mode`
    ///
    /// Groth16 keys are loaded from `config.prover.key_dir` for
    /// `config.tree.depth`; run `keygen` first.
    pub fn from_config(config: &ZktxConfig) -> Result<Self> {
        match config.prover.mode {
            ProverMode::Mock => {
                info!("Using mock proof oracle");
                Ok(Backend::Mock(MockOracle::new()))
            }
            ProverMode::Groth16 => {
                let dir = Path::new(&config.prover.key_dir);
                let oracle = Groth16Oracle::load(dir, config.tree.depth).with_context(|| {
                    format!(
                        "Failed to load Groth16 keys for depth {} (generate them with keygen)",
                        config.tree.depth
                    )
                })?;
                Ok(Backend::Groth16(Box::new(oracle)))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Mock(_) => "mock",
            Backend::Groth16(_) => "groth16",
        }
    }

    pub fn as_oracle(&self) -> &dyn ProofOracle {
        match self {
            Backend::Mock(oracle) => oracle,
            Backend::Groth16(oracle) => oracle.as_ref(),
        }
    }
}

impl ProofOracle for Backend {
    fn verification_key(&self, relation: Relation) -> zktx_core::Result<VerificationKey> {
        self.as_oracle().verification_key(relation)
    }

    fn generate_proof(
        &self,
        public: &PublicInputs,
        witness: &PrivateWitness,
    ) -> zktx_core::Result<Proof> {
        self.as_oracle().generate_proof(public, witness)
    }

    fn verify_proof(&self, vk: &VerificationKey, public: &PublicInputs, proof: &Proof) -> bool {
        self.as_oracle().verify_proof(vk, public, proof)
    }
}
