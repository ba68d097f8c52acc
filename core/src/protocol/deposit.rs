//! Deposit: replace `old_note` with `new_note = old_note + shielding_note`
//!
//! The shielding note records the serial of the note it replaces and is the
//! leaf later proven by a withdraw.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::delivery::{self, EncryptedNote};
use crate::error::{Error, Result};
use crate::note::{Note, Nullifier, RecipientKeyHash, ShieldingNote};
use crate::oracle::{
    DepositPublicInputs, DepositWitness, PrivateWitness, Proof, ProofOracle, PublicInputs,
    VerificationKey,
};
use crate::protocol::NullifierSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub old_note: Note,
    pub shielding_note: ShieldingNote,
    pub new_note: Note,
}

impl DepositRequest {
    /// Shield `value` for `recipient` on top of `old_note`, with fresh secrets
    pub fn new(old_note: Note, value: u64, recipient: RecipientKeyHash) -> Result<Self> {
        let total = old_note
            .value
            .checked_add(value)
            .ok_or(Error::ValueOverflow(old_note.value, value))?;
        let shielding_note = ShieldingNote::random(value, recipient, &old_note);
        Ok(Self {
            old_note,
            shielding_note,
            new_note: Note::random(total),
        })
    }

    pub fn from_parts(old_note: Note, shielding_note: ShieldingNote, new_note: Note) -> Self {
        Self {
            old_note,
            shielding_note,
            new_note,
        }
    }

    /// Opening of the shielding note, sealed for the recipient
    pub fn seal_for(&self, recipient_pk: &[u8; 32]) -> Result<EncryptedNote> {
        delivery::seal(&self.shielding_note, recipient_pk)
    }

    pub fn public_inputs(&self) -> DepositPublicInputs {
        DepositPublicInputs {
            old_commitment: self.old_note.commitment(),
            old_nullifier: self.old_note.nullifier(),
            shielding_commitment: self.shielding_note.commitment(),
            new_commitment: self.new_note.commitment(),
        }
    }

    pub fn private_witness(&self) -> DepositWitness {
        DepositWitness {
            old_note: self.old_note.clone(),
            shielding_note: self.shielding_note.clone(),
            new_note: self.new_note.clone(),
        }
    }
}

/// What the ledger receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTransaction {
    pub public_inputs: DepositPublicInputs,
    pub proof: Proof,
}

impl DepositTransaction {
    pub fn nullifier(&self) -> Nullifier {
        self.public_inputs.old_nullifier
    }
}

/// Build the deposit proof, refusing an old note that is already spent
pub fn prove_deposit(
    oracle: &dyn ProofOracle,
    spent: &dyn NullifierSet,
    request: &DepositRequest,
) -> Result<DepositTransaction> {
    let public_inputs = request.public_inputs();
    if spent.contains(&public_inputs.old_nullifier) {
        warn!(
            "Deposit refused: nullifier {} already spent",
            public_inputs.old_nullifier
        );
        return Err(Error::NullifierSpent(public_inputs.old_nullifier));
    }

    let proof = oracle.generate_proof(
        &PublicInputs::Deposit(public_inputs.clone()),
        &PrivateWitness::Deposit(request.private_witness()),
    )?;
    info!(
        "Deposit proved: shielding commitment {}",
        public_inputs.shielding_commitment
    );

    Ok(DepositTransaction {
        public_inputs,
        proof,
    })
}

pub fn verify_deposit(
    oracle: &dyn ProofOracle,
    vk: &VerificationKey,
    transaction: &DepositTransaction,
) -> bool {
    oracle.verify_proof(
        vk,
        &PublicInputs::Deposit(transaction.public_inputs.clone()),
        &transaction.proof,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, Relation};
    use crate::protocol::MemoryNullifierSet;

    #[test]
    fn test_new_conserves_value() {
        let old = Note::random(22);
        let request = DepositRequest::new(old.clone(), 8, RecipientKeyHash([1u8; 20])).unwrap();
        assert_eq!(request.new_note.value, 30);
        assert_eq!(request.shielding_note.consumed_serial, old.serial);
    }

    #[test]
    fn test_new_rejects_overflow() {
        let old = Note::random(u64::MAX);
        assert_eq!(
            DepositRequest::new(old, 1, RecipientKeyHash::default()),
            Err(Error::ValueOverflow(u64::MAX, 1))
        );
    }

    #[test]
    fn test_spent_note_refused() {
        let oracle = MockOracle::new();
        let request = DepositRequest::new(Note::random(5), 5, RecipientKeyHash::default()).unwrap();
        let mut spent = MemoryNullifierSet::new();
        spent.insert(request.old_note.nullifier());

        assert_eq!(
            prove_deposit(&oracle, &spent, &request),
            Err(Error::NullifierSpent(request.old_note.nullifier()))
        );
    }

    #[test]
    fn test_prove_then_verify() {
        let oracle = MockOracle::new();
        let request = DepositRequest::new(Note::random(1), 2, RecipientKeyHash::default()).unwrap();
        let tx = prove_deposit(&oracle, &MemoryNullifierSet::new(), &request).unwrap();
        let vk = oracle.verification_key(Relation::Deposit).unwrap();
        assert!(verify_deposit(&oracle, &vk, &tx));
        assert_eq!(tx.nullifier(), request.old_note.nullifier());
    }
}
