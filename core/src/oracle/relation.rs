//! Native evaluation of the proof relations
//!
//! These are the predicates the circuits enforce, checked directly on the
//! plaintext witness. Used by [`MockOracle`](super::MockOracle) and by the
//! Groth16 backend to refuse unsatisfiable witnesses before proving.

use std::fmt;

use super::{
    BalancePublicInputs, BalanceWitness, DepositPublicInputs, DepositWitness, PrivateWitness,
    PublicInputs, WithdrawPublicInputs, WithdrawWitness,
};
use crate::error::{Error, Result};
use crate::note::commit_header;

/// First predicate a witness fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    OldCommitment,
    NewCommitment,
    ShieldingCommitment,
    Nullifier,
    ValueConservation,
    ConsumedSerial,
    Recipient,
    Membership,
    HeaderBinding,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Violation::OldCommitment => "old note does not open old commitment",
            Violation::NewCommitment => "new note does not open new commitment",
            Violation::ShieldingCommitment => "shielding note does not open shielding commitment",
            Violation::Nullifier => "nullifier not derived from old note",
            Violation::ValueConservation => "values do not balance",
            Violation::ConsumedSerial => "shielding note consumes a different serial",
            Violation::Recipient => "recipient does not match shielding note",
            Violation::Membership => "shielding commitment not under root",
            Violation::HeaderBinding => "header does not bind root",
        };
        f.write_str(text)
    }
}

fn conserves(old: u64, shielded: u64, new: u64) -> bool {
    old.checked_add(shielded) == Some(new)
}

fn ensure(holds: bool, violation: Violation) -> std::result::Result<(), Violation> {
    if holds { Ok(()) } else { Err(violation) }
}

pub fn check_deposit(
    public: &DepositPublicInputs,
    witness: &DepositWitness,
) -> std::result::Result<(), Violation> {
    let DepositWitness {
        old_note,
        shielding_note,
        new_note,
    } = witness;

    ensure(
        old_note.commitment() == public.old_commitment,
        Violation::OldCommitment,
    )?;
    ensure(
        old_note.nullifier() == public.old_nullifier,
        Violation::Nullifier,
    )?;
    ensure(
        shielding_note.commitment() == public.shielding_commitment,
        Violation::ShieldingCommitment,
    )?;
    ensure(
        new_note.commitment() == public.new_commitment,
        Violation::NewCommitment,
    )?;
    ensure(
        shielding_note.consumed_serial == old_note.serial,
        Violation::ConsumedSerial,
    )?;
    ensure(
        conserves(old_note.value, shielding_note.value, new_note.value),
        Violation::ValueConservation,
    )
}

pub fn check_withdraw(
    public: &WithdrawPublicInputs,
    witness: &WithdrawWitness,
) -> std::result::Result<(), Violation> {
    let WithdrawWitness {
        shielding_note,
        old_note,
        new_note,
        root,
        path,
        prev_ref,
        next_ref,
    } = witness;

    // (a) membership of the shielding commitment
    ensure(
        path.verify(&shielding_note.commitment(), root),
        Violation::Membership,
    )?;
    // (b) header binds the same root
    ensure(
        commit_header(prev_ref, next_ref, root) == public.header_commitment,
        Violation::HeaderBinding,
    )?;
    // (c) value conservation
    ensure(
        conserves(old_note.value, shielding_note.value, new_note.value),
        Violation::ValueConservation,
    )?;
    // (d) nullifier derivation
    ensure(
        old_note.nullifier() == public.old_nullifier,
        Violation::Nullifier,
    )?;
    // (e) shielding note was minted for this spend
    ensure(
        shielding_note.consumed_serial == old_note.serial,
        Violation::ConsumedSerial,
    )?;

    ensure(
        shielding_note.recipient == public.recipient,
        Violation::Recipient,
    )?;
    ensure(
        old_note.commitment() == public.old_commitment,
        Violation::OldCommitment,
    )?;
    ensure(
        new_note.commitment() == public.new_commitment,
        Violation::NewCommitment,
    )
}

fn check_balance(
    public: &BalancePublicInputs,
    witness: &BalanceWitness,
    conserved: bool,
) -> std::result::Result<(), Violation> {
    ensure(
        witness.old_note.commitment() == public.old_commitment,
        Violation::OldCommitment,
    )?;
    ensure(
        witness.old_note.nullifier() == public.old_nullifier,
        Violation::Nullifier,
    )?;
    ensure(
        witness.new_note.commitment() == public.new_commitment,
        Violation::NewCommitment,
    )?;
    ensure(conserved, Violation::ValueConservation)
}

/// `old.value + value == new.value`
pub fn check_convert(
    public: &BalancePublicInputs,
    witness: &BalanceWitness,
) -> std::result::Result<(), Violation> {
    let conserved = conserves(witness.old_note.value, public.value, witness.new_note.value);
    check_balance(public, witness, conserved)
}

/// `new.value + value == old.value`
pub fn check_redeem(
    public: &BalancePublicInputs,
    witness: &BalanceWitness,
) -> std::result::Result<(), Violation> {
    let conserved = conserves(witness.new_note.value, public.value, witness.old_note.value);
    check_balance(public, witness, conserved)
}

/// `Ok(None)` when the witness satisfies the relation
pub fn first_violation(public: &PublicInputs, witness: &PrivateWitness) -> Result<Option<Violation>> {
    let outcome = match (public, witness) {
        (PublicInputs::Deposit(public), PrivateWitness::Deposit(witness)) => {
            check_deposit(public, witness)
        }
        (PublicInputs::Withdraw(public), PrivateWitness::Withdraw(witness)) => {
            check_withdraw(public, witness)
        }
        (PublicInputs::Convert(public), PrivateWitness::Convert(witness)) => {
            check_convert(public, witness)
        }
        (PublicInputs::Redeem(public), PrivateWitness::Redeem(witness)) => {
            check_redeem(public, witness)
        }
        _ => return Err(Error::RelationMismatch),
    };
    Ok(outcome.err())
}
