//! Convert and redeem: move value between a public balance and a note
//!
//! Both spend `old_note` and replace it with `new_note`. Convert adds the
//! public `value` to the note, redeem takes it out. Neither touches the
//! commitment tree.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::note::{Note, Nullifier};
use crate::oracle::{
    BalancePublicInputs, BalanceWitness, PrivateWitness, Proof, ProofOracle, PublicInputs,
    Relation, VerificationKey,
};
use crate::protocol::NullifierSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceKind {
    Convert,
    Redeem,
}

impl BalanceKind {
    pub fn relation(self) -> Relation {
        match self {
            BalanceKind::Convert => Relation::Convert,
            BalanceKind::Redeem => Relation::Redeem,
        }
    }

    pub fn public_inputs(self, inputs: BalancePublicInputs) -> PublicInputs {
        match self {
            BalanceKind::Convert => PublicInputs::Convert(inputs),
            BalanceKind::Redeem => PublicInputs::Redeem(inputs),
        }
    }

    pub fn private_witness(self, witness: BalanceWitness) -> PrivateWitness {
        match self {
            BalanceKind::Convert => PrivateWitness::Convert(witness),
            BalanceKind::Redeem => PrivateWitness::Redeem(witness),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub kind: BalanceKind,
    pub old_note: Note,
    pub new_note: Note,
    pub value: u64,
}

impl BalanceRequest {
    /// Add `value` from the public balance to `old_note`
    pub fn convert(old_note: Note, value: u64) -> Result<Self> {
        let total = old_note
            .value
            .checked_add(value)
            .ok_or(Error::ValueOverflow(old_note.value, value))?;
        Ok(Self::from_parts(
            BalanceKind::Convert,
            old_note,
            Note::random(total),
            value,
        ))
    }

    /// Take `value` out of `old_note` into the public balance
    pub fn redeem(old_note: Note, value: u64) -> Result<Self> {
        let rest = old_note
            .value
            .checked_sub(value)
            .ok_or(Error::ValueUnderflow(old_note.value, value))?;
        Ok(Self::from_parts(
            BalanceKind::Redeem,
            old_note,
            Note::random(rest),
            value,
        ))
    }

    pub fn from_parts(kind: BalanceKind, old_note: Note, new_note: Note, value: u64) -> Self {
        Self {
            kind,
            old_note,
            new_note,
            value,
        }
    }

    pub fn public_inputs(&self) -> BalancePublicInputs {
        BalancePublicInputs {
            old_commitment: self.old_note.commitment(),
            old_nullifier: self.old_note.nullifier(),
            new_commitment: self.new_note.commitment(),
            value: self.value,
        }
    }

    pub fn private_witness(&self) -> BalanceWitness {
        BalanceWitness {
            old_note: self.old_note.clone(),
            new_note: self.new_note.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTransaction {
    pub kind: BalanceKind,
    pub public_inputs: BalancePublicInputs,
    pub proof: Proof,
}

impl BalanceTransaction {
    pub fn nullifier(&self) -> Nullifier {
        self.public_inputs.old_nullifier
    }

    pub fn relation(&self) -> Relation {
        self.kind.relation()
    }
}

/// Prove a convert or redeem, refusing an old note that is already spent
pub fn prove_balance(
    oracle: &dyn ProofOracle,
    spent: &dyn NullifierSet,
    request: &BalanceRequest,
) -> Result<BalanceTransaction> {
    let kind = request.kind;
    let public_inputs = request.public_inputs();
    if spent.contains(&public_inputs.old_nullifier) {
        warn!(
            "{} refused: nullifier {} already spent",
            kind.relation(),
            public_inputs.old_nullifier
        );
        return Err(Error::NullifierSpent(public_inputs.old_nullifier));
    }

    let proof = oracle.generate_proof(
        &kind.public_inputs(public_inputs.clone()),
        &kind.private_witness(request.private_witness()),
    )?;
    info!("{} proved: {} public units", kind.relation(), request.value);

    Ok(BalanceTransaction {
        kind,
        public_inputs,
        proof,
    })
}

pub fn verify_balance(
    oracle: &dyn ProofOracle,
    vk: &VerificationKey,
    transaction: &BalanceTransaction,
) -> bool {
    oracle.verify_proof(
        vk,
        &transaction
            .kind
            .public_inputs(transaction.public_inputs.clone()),
        &transaction.proof,
    )
}
