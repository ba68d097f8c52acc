//! Withdraw: consume a shielding note from the tree together with the note it
//! was minted against
//!
//! The relation ties five things together: membership of the shielding
//! commitment under `root`, the header binding that root, value conservation,
//! the nullifier of `old_note`, and `consumed_serial == old_note.serial`.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::merkle::{IncrementalWitness, MerklePath};
use crate::note::{Note, NoteHeader, Nullifier, ShieldingNote, U256};
use crate::oracle::{
    PrivateWitness, Proof, ProofOracle, PublicInputs, VerificationKey, WithdrawPublicInputs,
    WithdrawWitness,
};
use crate::protocol::NullifierSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub shielding_note: ShieldingNote,
    pub path: MerklePath,
    /// Root the path proves against
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
    pub old_note: Note,
    pub new_note: Note,
    pub header: NoteHeader,
}

impl WithdrawRequest {
    /// Request against the witness's current root, with the header built
    /// from that root
    pub fn new(
        shielding_note: ShieldingNote,
        witness: &IncrementalWitness,
        old_note: Note,
        new_note: Note,
        prev_ref: U256,
        next_ref: U256,
    ) -> Result<Self> {
        let path = witness.path()?;
        let root = witness.root();
        Ok(Self {
            shielding_note,
            path,
            root,
            old_note,
            new_note,
            header: NoteHeader::new(prev_ref, next_ref, root),
        })
    }

    pub fn public_inputs(&self) -> WithdrawPublicInputs {
        WithdrawPublicInputs {
            header_commitment: self.header.commitment(),
            recipient: self.shielding_note.recipient,
            old_commitment: self.old_note.commitment(),
            old_nullifier: self.old_note.nullifier(),
            new_commitment: self.new_note.commitment(),
        }
    }

    pub fn private_witness(&self) -> WithdrawWitness {
        WithdrawWitness {
            shielding_note: self.shielding_note.clone(),
            old_note: self.old_note.clone(),
            new_note: self.new_note.clone(),
            root: self.root,
            path: self.path.clone(),
            prev_ref: self.header.prev_ref,
            next_ref: self.header.next_ref,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawTransaction {
    pub public_inputs: WithdrawPublicInputs,
    pub proof: Proof,
}

impl WithdrawTransaction {
    pub fn nullifier(&self) -> Nullifier {
        self.public_inputs.old_nullifier
    }
}

pub fn prove_withdraw(
    oracle: &dyn ProofOracle,
    spent: &dyn NullifierSet,
    request: &WithdrawRequest,
) -> Result<WithdrawTransaction> {
    let public_inputs = request.public_inputs();
    if spent.contains(&public_inputs.old_nullifier) {
        warn!(
            "Withdraw refused: nullifier {} already spent",
            public_inputs.old_nullifier
        );
        return Err(Error::NullifierSpent(public_inputs.old_nullifier));
    }

    let proof = oracle.generate_proof(
        &PublicInputs::Withdraw(public_inputs.clone()),
        &PrivateWitness::Withdraw(request.private_witness()),
    )?;
    info!(
        "Withdraw proved at position {}: nullifier {}",
        request.path.position(),
        public_inputs.old_nullifier
    );

    Ok(WithdrawTransaction {
        public_inputs,
        proof,
    })
}

/// Check a withdraw against public inputs the verifier rebuilt itself
pub fn verify_withdraw(
    oracle: &dyn ProofOracle,
    vk: &VerificationKey,
    expected: &WithdrawPublicInputs,
    proof: &Proof,
) -> bool {
    oracle.verify_proof(vk, &PublicInputs::Withdraw(expected.clone()), proof)
}
