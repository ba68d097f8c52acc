use log::{info, warn};

use super::relation::first_violation;
use super::{Proof, ProofOracle, PrivateWitness, PublicInputs, Relation, VerificationKey};
use crate::error::{Error, Result};

/// In-process oracle: checks the relation on the plaintext witness and
/// emits a keyed BLAKE3 tag over the public inputs as the "proof".
///
/// Not zero-knowledge and not sound against a party holding the key; for
/// tests and local wiring only.
#[derive(Debug, Clone)]
pub struct MockOracle {
    /// One key per relation, in [`Relation::ALL`] order
    keys: [[u8; 32]; 4],
}

impl MockOracle {
    pub fn new() -> Self {
        let keys = Relation::ALL.map(|relation| {
            *blake3::hash(format!("zktx-mock-vk-{relation}-v1").as_bytes()).as_bytes()
        });
        Self { keys }
    }

    fn key(&self, relation: Relation) -> [u8; 32] {
        self.keys[relation.index()]
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofOracle for MockOracle {
    fn verification_key(&self, relation: Relation) -> Result<VerificationKey> {
        Ok(VerificationKey {
            relation,
            bytes: self.key(relation).to_vec(),
        })
    }

    fn generate_proof(&self, public: &PublicInputs, witness: &PrivateWitness) -> Result<Proof> {
        let relation = public.relation();
        if let Some(violation) = first_violation(public, witness)? {
            warn!("Mock {relation} proof refused: {violation}");
            return Err(Error::Unsatisfied);
        }

        let tag = blake3::keyed_hash(&self.key(relation), &public.to_bytes());
        info!("Generated mock {relation} proof");
        Ok(Proof {
            relation,
            bytes: tag.as_bytes().to_vec(),
        })
    }

    fn verify_proof(&self, vk: &VerificationKey, public: &PublicInputs, proof: &Proof) -> bool {
        let relation = public.relation();
        if vk.relation != relation || proof.relation != relation {
            return false;
        }
        let Ok(key) = <[u8; 32]>::try_from(vk.bytes.as_slice()) else {
            return false;
        };
        let Ok(tag) = <[u8; 32]>::try_from(proof.bytes.as_slice()) else {
            return false;
        };
        // blake3::Hash equality is constant time
        blake3::Hash::from(tag) == blake3::keyed_hash(&key, &public.to_bytes())
    }
}
