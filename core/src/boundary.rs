//! Hex-string entry points for callers outside Rust
//!
//! Every argument is decoded and validated before any hashing or proving.
//! Results are owned `String`s; proof generation returns `Ok(None)` when the
//! inputs do not satisfy the relation.

use log::warn;

use serde::{Deserialize, Serialize};

use crate::codec::{
    decode_commitment, decode_commitment_blob, decode_encrypted_note, decode_field_bytes,
    decode_nullifier, decode_recipient, decode_u256, encode_hex,
};
use crate::delivery::{self, RecipientKeys};
use crate::error::{Error, Result, ValidationError};
use crate::merkle::{IncrementalTree, TREE_DEPTH};
use crate::note::{
    Commitment, Note, RecipientKeyHash, ShieldingNote, commit_header, derive_nullifier,
};
use crate::oracle::{
    BalancePublicInputs, BalanceWitness, DepositPublicInputs, DepositWitness, PrivateWitness,
    Proof, ProofOracle, PublicInputs, Relation, WithdrawPublicInputs, WithdrawWitness,
};
use crate::protocol::BalanceKind;

pub fn gen_commitment(value: u64, serial_hex: &str, randomness_hex: &str) -> Result<String> {
    let serial = decode_u256(serial_hex, "serial")?;
    let randomness = decode_u256(randomness_hex, "randomness")?;
    Ok(Note::new(value, serial, randomness).commitment().to_hex())
}

pub fn gen_shielding_commitment(
    value_s: u64,
    recipient_hex: &str,
    serial_s_hex: &str,
    randomness_s_hex: &str,
    consumed_serial_hex: &str,
) -> Result<String> {
    let note = ShieldingNote::new(
        value_s,
        decode_recipient(recipient_hex, "recipient")?,
        decode_u256(serial_s_hex, "serial_s")?,
        decode_u256(randomness_s_hex, "randomness_s")?,
        decode_u256(consumed_serial_hex, "consumed_serial")?,
    );
    Ok(note.commitment().to_hex())
}

pub fn gen_nullifier(serial_hex: &str, randomness_hex: &str) -> Result<String> {
    let serial = decode_u256(serial_hex, "serial")?;
    let randomness = decode_u256(randomness_hex, "randomness")?;
    Ok(derive_nullifier(&serial, &randomness).to_hex())
}

pub fn gen_header_commitment(prev_ref_hex: &str, next_ref_hex: &str, root_hex: &str) -> Result<String> {
    let prev_ref = decode_u256(prev_ref_hex, "prev_ref")?;
    let next_ref = decode_u256(next_ref_hex, "next_ref")?;
    let root = decode_field_bytes(root_hex, "root")?;
    Ok(commit_header(&prev_ref, &next_ref, &root).to_hex())
}

fn decode_leaves(blob: &str, n: usize, depth: usize) -> Result<Vec<Commitment>> {
    let capacity = IncrementalTree::with_depth(depth)?.capacity();
    if n == 0 || n as u64 > capacity {
        return Err(ValidationError::CountOutOfRange {
            count: n,
            max: capacity,
        }
        .into());
    }
    Ok(decode_commitment_blob(blob, n)?)
}

/// Root of a default-depth tree holding the `n` commitments in `blob`
pub fn gen_root(blob: &str, n: usize) -> Result<String> {
    gen_root_with_depth(blob, n, TREE_DEPTH)
}

pub fn gen_root_with_depth(blob: &str, n: usize, depth: usize) -> Result<String> {
    let leaves = decode_leaves(blob, n, depth)?;
    Ok(encode_hex(&IncrementalTree::from_leaves(depth, &leaves)?.root()))
}

/// Arguments of [`gen_withdraw_proof`], named as the ledger passes them
#[derive(Debug, Clone, Copy)]
pub struct WithdrawProofArgs<'a> {
    /// Header `prev_ref`
    pub root_hex: &'a str,
    /// Header `next_ref`
    pub ledger_root_hex: &'a str,
    pub value: u64,
    pub value_old: u64,
    pub serial_old_hex: &'a str,
    pub randomness_old_hex: &'a str,
    pub serial_hex: &'a str,
    pub randomness_hex: &'a str,
    pub serial_s_hex: &'a str,
    pub randomness_s_hex: &'a str,
    pub commit_old_hex: &'a str,
    pub commit_new_hex: &'a str,
    pub value_s: u64,
    pub recipient_hex: &'a str,
    pub consumed_serial_hex: &'a str,
    pub shielding_commit_hex: &'a str,
    pub commitments_blob: &'a str,
    pub n: usize,
    pub header_hex: &'a str,
}

pub fn gen_withdraw_proof(oracle: &dyn ProofOracle, args: &WithdrawProofArgs<'_>) -> Result<Option<String>> {
    gen_withdraw_proof_with_depth(oracle, args, TREE_DEPTH)
}

/// Rebuild the tree from the blob, extract the shielding commitment's path
/// and prove the withdraw. The header is `(root_hex, ledger_root_hex, tree
/// root)` and must match `header_hex`.
pub fn gen_withdraw_proof_with_depth(
    oracle: &dyn ProofOracle,
    args: &WithdrawProofArgs<'_>,
    depth: usize,
) -> Result<Option<String>> {
    let prev_ref = decode_u256(args.root_hex, "root")?;
    let next_ref = decode_u256(args.ledger_root_hex, "ledger_root")?;
    let old_note = Note::new(
        args.value_old,
        decode_u256(args.serial_old_hex, "serial_old")?,
        decode_u256(args.randomness_old_hex, "randomness_old")?,
    );
    let new_note = Note::new(
        args.value,
        decode_u256(args.serial_hex, "serial")?,
        decode_u256(args.randomness_hex, "randomness")?,
    );
    let shielding_note = ShieldingNote::new(
        args.value_s,
        decode_recipient(args.recipient_hex, "recipient")?,
        decode_u256(args.serial_s_hex, "serial_s")?,
        decode_u256(args.randomness_s_hex, "randomness_s")?,
        decode_u256(args.consumed_serial_hex, "consumed_serial")?,
    );
    let commit_old = decode_commitment(args.commit_old_hex, "commit_old")?;
    let commit_new = decode_commitment(args.commit_new_hex, "commit_new")?;
    let shielding_commit = decode_commitment(args.shielding_commit_hex, "shielding_commit")?;
    let header_commitment = decode_commitment(args.header_hex, "header")?;

    let leaves = decode_leaves(args.commitments_blob, args.n, depth)?;
    let Some(position) = leaves.iter().position(|leaf| *leaf == shielding_commit) else {
        warn!("Shielding commitment {shielding_commit} not among {} leaves", args.n);
        return Ok(None);
    };

    let prefix = IncrementalTree::from_leaves(depth, &leaves[..position])?;
    let mut witness = prefix.witness();
    for leaf in &leaves[position..] {
        witness.append(*leaf)?;
    }
    let root = witness.root();

    let public = PublicInputs::Withdraw(WithdrawPublicInputs {
        header_commitment,
        recipient: shielding_note.recipient,
        old_commitment: commit_old,
        old_nullifier: old_note.nullifier(),
        new_commitment: commit_new,
    });
    let private = PrivateWitness::Withdraw(WithdrawWitness {
        shielding_note,
        old_note,
        new_note,
        root,
        path: witness.path()?,
        prev_ref,
        next_ref,
    });

    match oracle.generate_proof(&public, &private) {
        Ok(proof) => Ok(Some(proof.to_hex())),
        Err(Error::Unsatisfied) => Ok(None),
        Err(err) => Err(err),
    }
}

/// `false` for any proof that does not match the given public inputs
pub fn verify_withdraw_proof(
    oracle: &dyn ProofOracle,
    proof_blob: &str,
    header_hex: &str,
    recipient_hex: &str,
    commit_old_hex: &str,
    nullifier_hex: &str,
    commit_new_hex: &str,
) -> Result<bool> {
    let proof = Proof::from_hex(proof_blob)?;
    let public = PublicInputs::Withdraw(WithdrawPublicInputs {
        header_commitment: decode_commitment(header_hex, "header")?,
        recipient: decode_recipient(recipient_hex, "recipient")?,
        old_commitment: decode_commitment(commit_old_hex, "commit_old")?,
        old_nullifier: decode_nullifier(nullifier_hex, "nullifier")?,
        new_commitment: decode_commitment(commit_new_hex, "commit_new")?,
    });
    if proof.relation != Relation::Withdraw {
        return Ok(false);
    }
    let vk = oracle.verification_key(Relation::Withdraw)?;
    Ok(oracle.verify_proof(&vk, &public, &proof))
}

/// Arguments of [`gen_deposit_proof`]
#[derive(Debug, Clone, Copy)]
pub struct DepositProofArgs<'a> {
    pub value_old: u64,
    pub serial_old_hex: &'a str,
    pub randomness_old_hex: &'a str,
    pub commit_old_hex: &'a str,
    pub value_s: u64,
    pub recipient_hex: &'a str,
    pub serial_s_hex: &'a str,
    pub randomness_s_hex: &'a str,
    pub shielding_commit_hex: &'a str,
    pub value: u64,
    pub serial_hex: &'a str,
    pub randomness_hex: &'a str,
    pub commit_new_hex: &'a str,
}

/// The shielding note consumes `serial_old`
pub fn gen_deposit_proof(oracle: &dyn ProofOracle, args: &DepositProofArgs<'_>) -> Result<Option<String>> {
    let old_note = Note::new(
        args.value_old,
        decode_u256(args.serial_old_hex, "serial_old")?,
        decode_u256(args.randomness_old_hex, "randomness_old")?,
    );
    let shielding_note = ShieldingNote::new(
        args.value_s,
        decode_recipient(args.recipient_hex, "recipient")?,
        decode_u256(args.serial_s_hex, "serial_s")?,
        decode_u256(args.randomness_s_hex, "randomness_s")?,
        old_note.serial,
    );
    let new_note = Note::new(
        args.value,
        decode_u256(args.serial_hex, "serial")?,
        decode_u256(args.randomness_hex, "randomness")?,
    );

    let public = PublicInputs::Deposit(DepositPublicInputs {
        old_commitment: decode_commitment(args.commit_old_hex, "commit_old")?,
        old_nullifier: old_note.nullifier(),
        shielding_commitment: decode_commitment(args.shielding_commit_hex, "shielding_commit")?,
        new_commitment: decode_commitment(args.commit_new_hex, "commit_new")?,
    });
    let private = PrivateWitness::Deposit(DepositWitness {
        old_note,
        shielding_note,
        new_note,
    });

    match oracle.generate_proof(&public, &private) {
        Ok(proof) => Ok(Some(proof.to_hex())),
        Err(Error::Unsatisfied) => Ok(None),
        Err(err) => Err(err),
    }
}

pub fn verify_deposit_proof(
    oracle: &dyn ProofOracle,
    proof_blob: &str,
    commit_old_hex: &str,
    nullifier_hex: &str,
    shielding_commit_hex: &str,
    commit_new_hex: &str,
) -> Result<bool> {
    let proof = Proof::from_hex(proof_blob)?;
    let public = PublicInputs::Deposit(DepositPublicInputs {
        old_commitment: decode_commitment(commit_old_hex, "commit_old")?,
        old_nullifier: decode_nullifier(nullifier_hex, "nullifier")?,
        shielding_commitment: decode_commitment(shielding_commit_hex, "shielding_commit")?,
        new_commitment: decode_commitment(commit_new_hex, "commit_new")?,
    });
    if proof.relation != Relation::Deposit {
        return Ok(false);
    }
    let vk = oracle.verification_key(Relation::Deposit)?;
    Ok(oracle.verify_proof(&vk, &public, &proof))
}

/// Arguments of [`gen_convert_proof`] and [`gen_redeem_proof`]
#[derive(Debug, Clone, Copy)]
pub struct BalanceProofArgs<'a> {
    pub value_old: u64,
    pub serial_old_hex: &'a str,
    pub randomness_old_hex: &'a str,
    pub commit_old_hex: &'a str,
    /// Public amount moved in (convert) or out (redeem)
    pub value_s: u64,
    pub value: u64,
    pub serial_hex: &'a str,
    pub randomness_hex: &'a str,
    pub commit_new_hex: &'a str,
}

fn gen_balance_proof(
    oracle: &dyn ProofOracle,
    kind: BalanceKind,
    args: &BalanceProofArgs<'_>,
) -> Result<Option<String>> {
    let old_note = Note::new(
        args.value_old,
        decode_u256(args.serial_old_hex, "serial_old")?,
        decode_u256(args.randomness_old_hex, "randomness_old")?,
    );
    let new_note = Note::new(
        args.value,
        decode_u256(args.serial_hex, "serial")?,
        decode_u256(args.randomness_hex, "randomness")?,
    );

    let public = kind.public_inputs(BalancePublicInputs {
        old_commitment: decode_commitment(args.commit_old_hex, "commit_old")?,
        old_nullifier: old_note.nullifier(),
        new_commitment: decode_commitment(args.commit_new_hex, "commit_new")?,
        value: args.value_s,
    });
    let private = kind.private_witness(BalanceWitness { old_note, new_note });

    match oracle.generate_proof(&public, &private) {
        Ok(proof) => Ok(Some(proof.to_hex())),
        Err(Error::Unsatisfied) => Ok(None),
        Err(err) => Err(err),
    }
}

/// `value = value_old + value_s`
pub fn gen_convert_proof(oracle: &dyn ProofOracle, args: &BalanceProofArgs<'_>) -> Result<Option<String>> {
    gen_balance_proof(oracle, BalanceKind::Convert, args)
}

/// `value = value_old - value_s`
pub fn gen_redeem_proof(oracle: &dyn ProofOracle, args: &BalanceProofArgs<'_>) -> Result<Option<String>> {
    gen_balance_proof(oracle, BalanceKind::Redeem, args)
}

fn verify_balance_proof(
    oracle: &dyn ProofOracle,
    kind: BalanceKind,
    proof_blob: &str,
    commit_old_hex: &str,
    nullifier_hex: &str,
    commit_new_hex: &str,
    value_s: u64,
) -> Result<bool> {
    let proof = Proof::from_hex(proof_blob)?;
    let public = kind.public_inputs(BalancePublicInputs {
        old_commitment: decode_commitment(commit_old_hex, "commit_old")?,
        old_nullifier: decode_nullifier(nullifier_hex, "nullifier")?,
        new_commitment: decode_commitment(commit_new_hex, "commit_new")?,
        value: value_s,
    });
    if proof.relation != kind.relation() {
        return Ok(false);
    }
    let vk = oracle.verification_key(kind.relation())?;
    Ok(oracle.verify_proof(&vk, &public, &proof))
}

pub fn verify_convert_proof(
    oracle: &dyn ProofOracle,
    proof_blob: &str,
    commit_old_hex: &str,
    nullifier_hex: &str,
    commit_new_hex: &str,
    value_s: u64,
) -> Result<bool> {
    verify_balance_proof(
        oracle,
        BalanceKind::Convert,
        proof_blob,
        commit_old_hex,
        nullifier_hex,
        commit_new_hex,
        value_s,
    )
}

pub fn verify_redeem_proof(
    oracle: &dyn ProofOracle,
    proof_blob: &str,
    commit_old_hex: &str,
    nullifier_hex: &str,
    commit_new_hex: &str,
    value_s: u64,
) -> Result<bool> {
    verify_balance_proof(
        oracle,
        BalanceKind::Redeem,
        proof_blob,
        commit_old_hex,
        nullifier_hex,
        commit_new_hex,
        value_s,
    )
}

/// Seal a shielding note opening to `recipient_pk_hex` (X25519)
///
/// The note names the hash of that key as its recipient. Returns the hex
/// blob `ephemeral_pk ‖ nonce ‖ ciphertext`.
pub fn encrypt_shielding_note(
    value_s: u64,
    serial_s_hex: &str,
    randomness_s_hex: &str,
    consumed_serial_hex: &str,
    recipient_pk_hex: &str,
) -> Result<String> {
    let recipient_pk = decode_u256(recipient_pk_hex, "recipient_pk")?;
    let note = ShieldingNote::new(
        value_s,
        RecipientKeyHash::from_public_key(&recipient_pk),
        decode_u256(serial_s_hex, "serial_s")?,
        decode_u256(randomness_s_hex, "randomness_s")?,
        decode_u256(consumed_serial_hex, "consumed_serial")?,
    );
    Ok(delivery::seal(&note, &recipient_pk)?.to_hex())
}

/// Shielding note recovered from an encrypted blob, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedNote {
    pub value_s: u64,
    pub recipient_hex: String,
    pub serial_s_hex: String,
    pub randomness_s_hex: String,
    pub consumed_serial_hex: String,
    pub shielding_commit_hex: String,
}

pub fn decrypt_shielding_note(blob_hex: &str, recipient_sk_hex: &str) -> Result<OpenedNote> {
    let encrypted = decode_encrypted_note(blob_hex, "encrypted_note")?;
    let keys = RecipientKeys::from_secret(decode_u256(recipient_sk_hex, "recipient_sk")?);
    let note = delivery::open(&encrypted, &keys)?;
    Ok(OpenedNote {
        value_s: note.value,
        recipient_hex: encode_hex(&note.recipient.0),
        serial_s_hex: encode_hex(&note.serial),
        randomness_s_hex: encode_hex(&note.randomness),
        consumed_serial_hex: encode_hex(&note.consumed_serial),
        shielding_commit_hex: note.commitment().to_hex(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_of(byte: u8) -> String {
        let mut bytes = [0u8; 32];
        bytes[0] = byte;
        encode_hex(&bytes)
    }

    #[test]
    fn test_gen_commitment_matches_note() {
        let mut serial = [0u8; 32];
        serial[0] = 1;
        let expected = Note::new(14, serial, [0u8; 32]).commitment().to_hex();
        assert_eq!(gen_commitment(14, &hex_of(1), &hex_of(0)).unwrap(), expected);
        assert_ne!(gen_commitment(15, &hex_of(1), &hex_of(0)).unwrap(), expected);
    }

    #[test]
    fn test_gen_commitment_rejects_bad_hex() {
        let err = gen_commitment(1, "0x12", &hex_of(0)).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::Length { field: "serial", .. })
        ));
    }

    #[test]
    fn test_gen_root_count_bounds() {
        let blob = hex_of(1);
        assert!(matches!(
            gen_root(&blob, 0),
            Err(Error::Validation(ValidationError::CountOutOfRange { .. }))
        ));
        assert!(matches!(
            gen_root_with_depth(&format!("{blob}{blob}{blob}"), 3, 1),
            Err(Error::Validation(ValidationError::CountOutOfRange { count: 3, max: 2 }))
        ));
        assert!(matches!(
            gen_root(&blob, 2),
            Err(Error::Validation(ValidationError::BlobLength { .. }))
        ));
    }

    #[test]
    fn test_gen_root_matches_tree() {
        let blob = format!("{}{}", hex_of(1), hex_of(2));
        let leaves = decode_commitment_blob(&blob, 2).unwrap();
        let tree = IncrementalTree::from_leaves(TREE_DEPTH, &leaves).unwrap();
        assert_eq!(gen_root(&blob, 2).unwrap(), encode_hex(&tree.root()));
    }

    #[test]
    fn test_gen_nullifier() {
        let a = gen_nullifier(&hex_of(1), &hex_of(2)).unwrap();
        let b = gen_nullifier(&hex_of(1), &hex_of(3)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 66);
    }
}
