//! Proof oracle interface
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Deposit public inputs                                      │
//! │   old_commitment · old_nullifier · shielding_commitment ·  │
//! │   new_commitment                                           │
//! ├────────────────────────────────────────────────────────────┤
//! │ Withdraw public inputs                                     │
//! │   header_commitment · recipient · old_commitment ·         │
//! │   old_nullifier · new_commitment                           │
//! ├────────────────────────────────────────────────────────────┤
//! │ Convert / redeem public inputs                             │
//! │   old_commitment · old_nullifier · new_commitment · value  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Proving backends implement [`ProofOracle`]. Proof generation fails with
//! [`Error::Unsatisfied`](crate::Error::Unsatisfied) when the private witness
//! does not satisfy the relation; verification is a plain `bool`.

mod mock;
pub mod relation;

pub use mock::MockOracle;
pub use relation::Violation;

use std::fmt;

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::merkle::MerklePath;
use crate::note::{Commitment, Note, Nullifier, RecipientKeyHash, ShieldingNote, U256};

// ============================================================================
// Relations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Deposit,
    Withdraw,
    /// Public balance into a note
    Convert,
    /// Note value back to the public balance
    Redeem,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Deposit,
        Relation::Withdraw,
        Relation::Convert,
        Relation::Redeem,
    ];

    /// First byte of an encoded proof blob
    pub fn tag(self) -> u8 {
        match self {
            Relation::Deposit => 1,
            Relation::Withdraw => 2,
            Relation::Convert => 3,
            Relation::Redeem => 4,
        }
    }

    /// Position in [`Relation::ALL`]
    pub fn index(self) -> usize {
        usize::from(self.tag() - 1)
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|relation| relation.tag() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Deposit => "deposit",
            Relation::Withdraw => "withdraw",
            Relation::Convert => "convert",
            Relation::Redeem => "redeem",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Public inputs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPublicInputs {
    pub old_commitment: Commitment,
    pub old_nullifier: Nullifier,
    pub shielding_commitment: Commitment,
    pub new_commitment: Commitment,
}

impl DepositPublicInputs {
    pub fn to_field_elements(&self) -> Vec<Fr> {
        vec![
            self.old_commitment.to_field(),
            self.old_nullifier.to_field(),
            self.shielding_commitment.to_field(),
            self.new_commitment.to_field(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPublicInputs {
    pub header_commitment: Commitment,
    pub recipient: RecipientKeyHash,
    pub old_commitment: Commitment,
    pub old_nullifier: Nullifier,
    pub new_commitment: Commitment,
}

impl WithdrawPublicInputs {
    pub fn to_field_elements(&self) -> Vec<Fr> {
        vec![
            self.header_commitment.to_field(),
            self.recipient.to_field(),
            self.old_commitment.to_field(),
            self.old_nullifier.to_field(),
            self.new_commitment.to_field(),
        ]
    }
}

/// Convert and redeem share one shape; `value` is the public amount moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePublicInputs {
    pub old_commitment: Commitment,
    pub old_nullifier: Nullifier,
    pub new_commitment: Commitment,
    pub value: u64,
}

impl BalancePublicInputs {
    pub fn to_field_elements(&self) -> Vec<Fr> {
        vec![
            self.old_commitment.to_field(),
            self.old_nullifier.to_field(),
            self.new_commitment.to_field(),
            Fr::from(self.value),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicInputs {
    Deposit(DepositPublicInputs),
    Withdraw(WithdrawPublicInputs),
    Convert(BalancePublicInputs),
    Redeem(BalancePublicInputs),
}

impl PublicInputs {
    pub fn relation(&self) -> Relation {
        match self {
            PublicInputs::Deposit(_) => Relation::Deposit,
            PublicInputs::Withdraw(_) => Relation::Withdraw,
            PublicInputs::Convert(_) => Relation::Convert,
            PublicInputs::Redeem(_) => Relation::Redeem,
        }
    }

    /// Field elements in circuit input order
    pub fn to_field_elements(&self) -> Vec<Fr> {
        match self {
            PublicInputs::Deposit(inputs) => inputs.to_field_elements(),
            PublicInputs::Withdraw(inputs) => inputs.to_field_elements(),
            PublicInputs::Convert(inputs) | PublicInputs::Redeem(inputs) => {
                inputs.to_field_elements()
            }
        }
    }

    /// Relation tag followed by every input's canonical bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.relation().tag()];
        match self {
            PublicInputs::Deposit(inputs) => {
                out.extend_from_slice(&inputs.old_commitment.0);
                out.extend_from_slice(&inputs.old_nullifier.0);
                out.extend_from_slice(&inputs.shielding_commitment.0);
                out.extend_from_slice(&inputs.new_commitment.0);
            }
            PublicInputs::Withdraw(inputs) => {
                out.extend_from_slice(&inputs.header_commitment.0);
                out.extend_from_slice(&inputs.recipient.0);
                out.extend_from_slice(&inputs.old_commitment.0);
                out.extend_from_slice(&inputs.old_nullifier.0);
                out.extend_from_slice(&inputs.new_commitment.0);
            }
            PublicInputs::Convert(inputs) | PublicInputs::Redeem(inputs) => {
                out.extend_from_slice(&inputs.old_commitment.0);
                out.extend_from_slice(&inputs.old_nullifier.0);
                out.extend_from_slice(&inputs.new_commitment.0);
                out.extend_from_slice(&inputs.value.to_le_bytes());
            }
        }
        out
    }
}

// ============================================================================
// Private witnesses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepositWitness {
    pub old_note: Note,
    pub shielding_note: ShieldingNote,
    pub new_note: Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WithdrawWitness {
    pub shielding_note: ShieldingNote,
    pub old_note: Note,
    pub new_note: Note,
    /// Root the membership path proves against
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
    pub path: MerklePath,
    #[serde(with = "hex::serde")]
    pub prev_ref: U256,
    #[serde(with = "hex::serde")]
    pub next_ref: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceWitness {
    pub old_note: Note,
    pub new_note: Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivateWitness {
    Deposit(DepositWitness),
    Withdraw(WithdrawWitness),
    Convert(BalanceWitness),
    Redeem(BalanceWitness),
}

impl PrivateWitness {
    pub fn relation(&self) -> Relation {
        match self {
            PrivateWitness::Deposit(_) => Relation::Deposit,
            PrivateWitness::Withdraw(_) => Relation::Withdraw,
            PrivateWitness::Convert(_) => Relation::Convert,
            PrivateWitness::Redeem(_) => Relation::Redeem,
        }
    }
}

// ============================================================================
// Proofs and keys
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub relation: Relation,
    #[serde(with = "hex::serde")]
    pub bytes: Vec<u8>,
}

impl Proof {
    /// `0x` + hex of the relation tag and the backend bytes
    pub fn to_hex(&self) -> String {
        let mut blob = Vec::with_capacity(self.bytes.len() + 1);
        blob.push(self.relation.tag());
        blob.extend_from_slice(&self.bytes);
        format!("0x{}", hex::encode(blob))
    }

    pub fn from_hex(input: &str) -> std::result::Result<Self, ValidationError> {
        let digits = input
            .strip_prefix("0x")
            .ok_or(ValidationError::MissingPrefix { field: "proof" })?;
        let blob =
            hex::decode(digits).map_err(|_| ValidationError::InvalidHex { field: "proof" })?;
        let (tag, bytes) = blob
            .split_first()
            .ok_or(ValidationError::MalformedProof("empty blob"))?;
        let relation =
            Relation::from_tag(*tag).ok_or(ValidationError::MalformedProof("unknown relation"))?;
        Ok(Self {
            relation,
            bytes: bytes.to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub relation: Relation,
    #[serde(with = "hex::serde")]
    pub bytes: Vec<u8>,
}

// ============================================================================
// Oracle trait
// ============================================================================

/// A proving backend for every [`Relation`]
pub trait ProofOracle: Send + Sync {
    /// Key that [`ProofOracle::verify_proof`] expects for `relation`
    fn verification_key(&self, relation: Relation) -> Result<VerificationKey>;

    /// Prove that `witness` satisfies the relation for `public`
    fn generate_proof(&self, public: &PublicInputs, witness: &PrivateWitness) -> Result<Proof>;

    /// `false` on any mismatch between key, inputs and proof
    fn verify_proof(&self, vk: &VerificationKey, public: &PublicInputs, proof: &Proof) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_hex_roundtrip() {
        let proof = Proof {
            relation: Relation::Withdraw,
            bytes: vec![0xab; 40],
        };
        let encoded = proof.to_hex();
        assert!(encoded.starts_with("0x02"));
        assert_eq!(Proof::from_hex(&encoded), Ok(proof));
    }

    #[test]
    fn test_proof_hex_rejects_garbage() {
        assert_eq!(
            Proof::from_hex("02ab"),
            Err(ValidationError::MissingPrefix { field: "proof" })
        );
        assert_eq!(
            Proof::from_hex("0xzz"),
            Err(ValidationError::InvalidHex { field: "proof" })
        );
        assert_eq!(
            Proof::from_hex("0x"),
            Err(ValidationError::MalformedProof("empty blob"))
        );
        assert_eq!(
            Proof::from_hex("0x09ff"),
            Err(ValidationError::MalformedProof("unknown relation"))
        );
    }

    #[test]
    fn test_relation_tags_are_distinct() {
        for relation in Relation::ALL {
            assert_eq!(Relation::from_tag(relation.tag()), Some(relation));
            assert_eq!(Relation::ALL[relation.index()], relation);
        }
        assert_eq!(Relation::from_tag(0), None);
        assert_eq!(Relation::Redeem.to_string(), "redeem");
    }

    #[test]
    fn test_balance_inputs_carry_value() {
        let inputs = BalancePublicInputs {
            old_commitment: Commitment::from_field(&Fr::from(1u64)),
            old_nullifier: Nullifier::from_field(&Fr::from(2u64)),
            new_commitment: Commitment::from_field(&Fr::from(3u64)),
            value: 40,
        };
        let convert = PublicInputs::Convert(inputs.clone());
        let redeem = PublicInputs::Redeem(inputs);
        assert_eq!(convert.to_field_elements()[3], Fr::from(40u64));
        assert_eq!(convert.to_field_elements(), redeem.to_field_elements());
        // Same inputs, different relation tag
        assert_ne!(convert.to_bytes(), redeem.to_bytes());
    }

    #[test]
    fn test_public_input_order() {
        let inputs = WithdrawPublicInputs {
            header_commitment: Commitment::from_field(&Fr::from(1u64)),
            recipient: RecipientKeyHash([0u8; 20]),
            old_commitment: Commitment::from_field(&Fr::from(3u64)),
            old_nullifier: Nullifier::from_field(&Fr::from(4u64)),
            new_commitment: Commitment::from_field(&Fr::from(5u64)),
        };
        let fields = PublicInputs::Withdraw(inputs).to_field_elements();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], Fr::from(1u64));
        assert_eq!(fields[1], Fr::from(0u64));
        assert_eq!(fields[4], Fr::from(5u64));
    }
}
