//! Convert and redeem circuit
//!
//! Public inputs (order matters for the verifier):
//! 1. old_commitment
//! 2. old_nullifier
//! 3. new_commitment
//! 4. value
//!
//! Convert enforces `old + value == new`, redeem `new + value == old`.

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use zktx_core::oracle::{BalancePublicInputs, BalanceWitness};
use zktx_core::protocol::BalanceKind;

use super::gadgets::{NoteVar, enforce_conservation};

#[derive(Clone)]
pub struct BalanceCircuit {
    pub kind: BalanceKind,
    pub public: BalancePublicInputs,
    pub witness: BalanceWitness,
}

impl BalanceCircuit {
    pub fn new(kind: BalanceKind, public: BalancePublicInputs, witness: BalanceWitness) -> Self {
        Self {
            kind,
            public,
            witness,
        }
    }

    /// Placeholder assignment for key generation
    pub fn blank(kind: BalanceKind) -> Self {
        let witness = BalanceWitness::default();
        let public = BalancePublicInputs {
            old_commitment: witness.old_note.commitment(),
            old_nullifier: witness.old_note.nullifier(),
            new_commitment: witness.new_note.commitment(),
            value: 0,
        };
        Self {
            kind,
            public,
            witness,
        }
    }
}

impl ConstraintSynthesizer<Fr> for BalanceCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let old_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.old_commitment.to_field()))?;
        let old_nullifier =
            FpVar::new_input(cs.clone(), || Ok(self.public.old_nullifier.to_field()))?;
        let new_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.new_commitment.to_field()))?;
        let value = FpVar::new_input(cs.clone(), || Ok(Fr::from(self.public.value)))?;

        let old = NoteVar::new_witness(cs.clone(), &self.witness.old_note)?;
        let new = NoteVar::new_witness(cs.clone(), &self.witness.new_note)?;

        old.commitment(cs.clone())?.enforce_equal(&old_commitment)?;
        old.nullifier(cs.clone())?.enforce_equal(&old_nullifier)?;
        new.commitment(cs)?.enforce_equal(&new_commitment)?;

        match self.kind {
            BalanceKind::Convert => enforce_conservation(&old.value, &value, &new.value),
            BalanceKind::Redeem => enforce_conservation(&new.value, &value, &old.value),
        }
    }
}
