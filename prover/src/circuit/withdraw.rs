//! Withdraw circuit
//!
//! Public inputs (order matters for the verifier):
//! 1. header_commitment
//! 2. recipient
//! 3. old_commitment
//! 4. old_nullifier
//! 5. new_commitment
//!
//! Enforces membership of the shielding commitment under `root`, that the
//! header binds `root`, value conservation, the nullifier of the old note and
//! `consumed_serial == old.serial`.

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use zktx_core::merkle::MerklePath;
use zktx_core::oracle::{WithdrawPublicInputs, WithdrawWitness};
use zktx_core::poseidon::fr_from_bytes;

use super::gadgets::{NoteVar, ShieldingNoteVar, U256Var, commit_header_var, enforce_conservation};
use super::merkle::root_from_path;

#[derive(Clone)]
pub struct WithdrawCircuit {
    pub public: WithdrawPublicInputs,
    pub witness: WithdrawWitness,
    /// Tree depth the keys are generated for
    pub depth: usize,
}

impl WithdrawCircuit {
    pub fn new(public: WithdrawPublicInputs, witness: WithdrawWitness, depth: usize) -> Self {
        Self {
            public,
            witness,
            depth,
        }
    }

    /// Placeholder assignment for key generation
    pub fn blank(depth: usize) -> Self {
        let mut witness = WithdrawWitness {
            path: MerklePath {
                siblings: vec![[0u8; 32]; depth],
                path_bits: vec![false; depth],
            },
            ..WithdrawWitness::default()
        };
        witness.root = witness.path.root(&witness.shielding_note.commitment());

        let public = WithdrawPublicInputs {
            header_commitment: zktx_core::note::commit_header(
                &witness.prev_ref,
                &witness.next_ref,
                &witness.root,
            ),
            recipient: witness.shielding_note.recipient,
            old_commitment: witness.old_note.commitment(),
            old_nullifier: witness.old_note.nullifier(),
            new_commitment: witness.new_note.commitment(),
        };
        Self {
            public,
            witness,
            depth,
        }
    }
}

impl ConstraintSynthesizer<Fr> for WithdrawCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // =====================================================================
        // Public inputs
        // =====================================================================
        let header_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.header_commitment.to_field()))?;
        let recipient = FpVar::new_input(cs.clone(), || Ok(self.public.recipient.to_field()))?;
        let old_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.old_commitment.to_field()))?;
        let old_nullifier =
            FpVar::new_input(cs.clone(), || Ok(self.public.old_nullifier.to_field()))?;
        let new_commitment =
            FpVar::new_input(cs.clone(), || Ok(self.public.new_commitment.to_field()))?;

        // =====================================================================
        // Private witness
        // =====================================================================
        let witness = &self.witness;
        let shielding = ShieldingNoteVar::new_witness(cs.clone(), &witness.shielding_note)?;
        let old = NoteVar::new_witness(cs.clone(), &witness.old_note)?;
        let new = NoteVar::new_witness(cs.clone(), &witness.new_note)?;
        let root = FpVar::new_witness(cs.clone(), || Ok(fr_from_bytes(&witness.root)))?;
        let prev_ref = U256Var::new_witness(cs.clone(), &witness.prev_ref)?;
        let next_ref = U256Var::new_witness(cs.clone(), &witness.next_ref)?;

        // (a) shielding commitment is a leaf under root
        let leaf = shielding.commitment(cs.clone())?;
        root_from_path(cs.clone(), &leaf, &witness.path, self.depth)?.enforce_equal(&root)?;

        // (b) header binds root
        commit_header_var(cs.clone(), &prev_ref, &next_ref, &root)?
            .enforce_equal(&header_commitment)?;

        // (c) value conservation
        enforce_conservation(&old.value, &shielding.value, &new.value)?;

        // (d) nullifier of the old note
        old.nullifier(cs.clone())?.enforce_equal(&old_nullifier)?;

        // (e) shielding note was minted against the old note
        shielding.consumed_serial.enforce_equal(&old.serial)?;

        shielding.recipient.enforce_equal(&recipient)?;
        old.commitment(cs.clone())?.enforce_equal(&old_commitment)?;
        new.commitment(cs)?.enforce_equal(&new_commitment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use zktx_core::merkle::IncrementalTree;
    use zktx_core::note::{Note, NoteHeader, RecipientKeyHash, ShieldingNote};

    const DEPTH: usize = 4;

    fn circuit() -> WithdrawCircuit {
        let old_note = Note::new(10, [1u8; 32], [2u8; 32]);
        let shielding_note =
            ShieldingNote::new(5, RecipientKeyHash([7u8; 20]), [3u8; 32], [4u8; 32], old_note.serial);
        let new_note = Note::new(15, [5u8; 32], [6u8; 32]);

        let mut tree = IncrementalTree::with_depth(DEPTH).unwrap();
        tree.append(Note::new(1, [0u8; 32], [0u8; 32]).commitment()).unwrap();
        let mut witness = tree.witness();
        tree.append(shielding_note.commitment()).unwrap();
        witness.append(shielding_note.commitment()).unwrap();

        let header = NoteHeader::new([8u8; 32], [9u8; 32], tree.root());
        let public = WithdrawPublicInputs {
            header_commitment: header.commitment(),
            recipient: shielding_note.recipient,
            old_commitment: old_note.commitment(),
            old_nullifier: old_note.nullifier(),
            new_commitment: new_note.commitment(),
        };
        let private = WithdrawWitness {
            shielding_note,
            old_note,
            new_note,
            root: tree.root(),
            path: witness.path().unwrap(),
            prev_ref: header.prev_ref,
            next_ref: header.next_ref,
        };
        WithdrawCircuit::new(public, private, DEPTH)
    }

    fn satisfied(circuit: WithdrawCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_valid_withdraw_satisfies() {
        assert!(satisfied(circuit()));
    }

    #[test]
    fn test_blank_circuit_satisfies() {
        assert!(satisfied(WithdrawCircuit::blank(DEPTH)));
    }

    #[test]
    fn test_substituted_root_unsatisfied() {
        let mut circuit = circuit();
        let other = IncrementalTree::with_depth(DEPTH).unwrap();
        circuit.public.header_commitment =
            NoteHeader::new([8u8; 32], [9u8; 32], other.root()).commitment();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_wrong_recipient_unsatisfied() {
        let mut circuit = circuit();
        circuit.public.recipient = RecipientKeyHash([0u8; 20]);
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_redirected_shielding_note_unsatisfied() {
        let mut circuit = circuit();
        circuit.witness.old_note.serial = [0x11; 32];
        circuit.public.old_commitment = circuit.witness.old_note.commitment();
        circuit.public.old_nullifier = circuit.witness.old_note.nullifier();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_short_path_unsatisfied() {
        let mut circuit = circuit();
        circuit.witness.path.siblings.pop();
        circuit.witness.path.path_bits.pop();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_constraint_count_independent_of_witness() {
        let count = |circuit: WithdrawCircuit| {
            let cs = ConstraintSystem::<Fr>::new_ref();
            circuit.generate_constraints(cs.clone()).unwrap();
            cs.num_constraints()
        };
        assert_eq!(count(circuit()), count(WithdrawCircuit::blank(DEPTH)));
    }
}
