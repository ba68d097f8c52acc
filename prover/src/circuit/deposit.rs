//! Deposit circuit
//!
//! Public inputs (order matters for the verifier):
//! 1. old_commitment
//! 2. old_nullifier
//! 3. shielding_commitment
//! 4. new_commitment
//!
//! Private witness: the old, shielding and new notes.

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use zktx_core::oracle::{DepositPublicInputs, DepositWitness};

use super::gadgets::{NoteVar, ShieldingNoteVar, enforce_conservation};

#[derive(Clone)]
pub struct DepositCircuit {
    pub public: DepositPublicInputs,
    pub witness: DepositWitness,
}

impl DepositCircuit {
    pub fn new(public: DepositPublicInputs, witness: DepositWitness) -> Self {
        Self { public, witness }
    }

    /// Placeholder assignment for key generation
    pub fn blank() -> Self {
        let witness = DepositWitness::default();
        let public = DepositPublicInputs {
            old_commitment: witness.old_note.commitment(),
            old_nullifier: witness.old_note.nullifier(),
            shielding_commitment: witness.shielding_note.commitment(),
            new_commitment: witness.new_note.commitment(),
        };
        Self { public, witness }
    }
}

impl ConstraintSynthesizer<Fr> for DepositCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // =====================================================================
        // Public inputs
        // =====================================================================
        let old_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.old_commitment.to_field()))?;
        let old_nullifier =
            FpVar::new_input(cs.clone(), || Ok(self.public.old_nullifier.to_field()))?;
        let shielding_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.shielding_commitment.to_field()))?;
        let new_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.new_commitment.to_field()))?;

        // =====================================================================
        // Private witness
        // =====================================================================
        let old = NoteVar::new_witness(cs.clone(), &self.witness.old_note)?;
        let shielding = ShieldingNoteVar::new_witness(cs.clone(), &self.witness.shielding_note)?;
        let new = NoteVar::new_witness(cs.clone(), &self.witness.new_note)?;

        // =====================================================================
        // Constraints
        // =====================================================================
        old.commitment(cs.clone())?.enforce_equal(&old_commitment)?;
        old.nullifier(cs.clone())?.enforce_equal(&old_nullifier)?;
        shielding
            .commitment(cs.clone())?
            .enforce_equal(&shielding_commitment)?;
        new.commitment(cs)?.enforce_equal(&new_commitment)?;

        shielding.consumed_serial.enforce_equal(&old.serial)?;
        enforce_conservation(&old.value, &shielding.value, &new.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use zktx_core::note::{Note, RecipientKeyHash, ShieldingNote};

    fn circuit(new_value: u64) -> DepositCircuit {
        let old_note = Note::new(22, [1u8; 32], [2u8; 32]);
        let shielding_note =
            ShieldingNote::new(8, RecipientKeyHash([7u8; 20]), [3u8; 32], [4u8; 32], old_note.serial);
        let new_note = Note::new(new_value, [5u8; 32], [6u8; 32]);
        let public = DepositPublicInputs {
            old_commitment: old_note.commitment(),
            old_nullifier: old_note.nullifier(),
            shielding_commitment: shielding_note.commitment(),
            new_commitment: new_note.commitment(),
        };
        DepositCircuit::new(
            public,
            DepositWitness {
                old_note,
                shielding_note,
                new_note,
            },
        )
    }

    fn satisfied(circuit: DepositCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_valid_deposit_satisfies() {
        assert!(satisfied(circuit(30)));
    }

    #[test]
    fn test_wrong_total_unsatisfied() {
        assert!(!satisfied(circuit(31)));
    }

    #[test]
    fn test_blank_circuit_satisfies() {
        // Default notes: 0 + 0 == 0 and consumed serial equals the zero serial
        assert!(satisfied(DepositCircuit::blank()));
    }

    #[test]
    fn test_public_input_count() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit(30).generate_constraints(cs.clone()).unwrap();
        // Includes the constant-one input
        assert_eq!(cs.num_instance_variables(), 5);
    }
}
