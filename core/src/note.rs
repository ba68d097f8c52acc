//! Notes and their commitments
//!
//! ```text
//! Note           cm  = CRH(tag_note   ‖ value ‖ serial ‖ randomness)
//! ShieldingNote  cmS = CRH(tag_shield ‖ value ‖ recipient ‖ serial_s ‖ randomness_s ‖ consumed_serial)
//! NoteHeader     hdr = CRH(tag_header ‖ prev_ref ‖ next_ref ‖ root_lo ‖ root_hi)
//! Nullifier      nf  = CRH(tag_nf     ‖ serial ‖ randomness)
//! ```
//!
//! Field order is part of the external contract: the circuits recompute the
//! same hashes over the same sequence of field elements.

use std::fmt;

use ark_bn254::Fr;
use rand_core::{OsRng, RngCore, TryRngCore};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::poseidon::{self, domain, fr_from_canonical, fr_to_bytes, hash_fields, limbs};

/// 256-bit opaque value (serial numbers, randomness, header links)
pub type U256 = [u8; 32];

/// Commitment to a note, header or shielding note (canonical field element)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Commitment(#[serde(with = "hex::serde")] pub [u8; 32]);

/// Serial number published when a note is spent
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Nullifier(#[serde(with = "hex::serde")] pub [u8; 32]);

/// 160-bit hash of the recipient's public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RecipientKeyHash(#[serde(with = "hex::serde")] pub [u8; 20]);

macro_rules! field_newtype {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Wrap 32 bytes, rejecting values outside the scalar field
            pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, ValidationError> {
                match fr_from_canonical(&bytes) {
                    Some(_) => Ok(Self(bytes)),
                    None => Err(ValidationError::NonCanonical { field: $label }),
                }
            }

            pub fn from_field(value: &Fr) -> Self {
                Self(fr_to_bytes(value))
            }

            pub fn to_field(&self) -> Fr {
                poseidon::fr_from_bytes(&self.0)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..8]))
            }
        }
    };
}

field_newtype!(Commitment, "commitment");
field_newtype!(Nullifier, "nullifier");

impl RecipientKeyHash {
    pub fn to_field(&self) -> Fr {
        poseidon::fr_from_bytes(&self.0)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RecipientKeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecipientKeyHash({})", hex::encode(self.0))
    }
}

pub(crate) fn random_u256() -> U256 {
    let mut out = [0u8; 32];
    OsRng.unwrap_err().fill_bytes(&mut out);
    out
}

// ============================================================================
// Commitment functions
// ============================================================================

pub fn commit_note(value: u64, serial: &U256, randomness: &U256) -> Commitment {
    let [serial_lo, serial_hi] = limbs(serial);
    let [r_lo, r_hi] = limbs(randomness);
    Commitment::from_field(&hash_fields(&[
        Fr::from(domain::NOTE),
        Fr::from(value),
        serial_lo,
        serial_hi,
        r_lo,
        r_hi,
    ]))
}

pub fn commit_shielding(
    value: u64,
    recipient: &RecipientKeyHash,
    serial_s: &U256,
    randomness_s: &U256,
    consumed_serial: &U256,
) -> Commitment {
    let [serial_lo, serial_hi] = limbs(serial_s);
    let [r_lo, r_hi] = limbs(randomness_s);
    let [consumed_lo, consumed_hi] = limbs(consumed_serial);
    Commitment::from_field(&hash_fields(&[
        Fr::from(domain::SHIELDING),
        Fr::from(value),
        recipient.to_field(),
        serial_lo,
        serial_hi,
        r_lo,
        r_hi,
        consumed_lo,
        consumed_hi,
    ]))
}

/// Binds a merkle root (plus two linkage fields) into one public value
///
/// The root is absorbed as two limbs, like every other 256-bit field, so
/// distinct root encodings never share a header commitment.
pub fn commit_header(prev_ref: &U256, next_ref: &U256, root: &[u8; 32]) -> Commitment {
    let [prev_lo, prev_hi] = limbs(prev_ref);
    let [next_lo, next_hi] = limbs(next_ref);
    let [root_lo, root_hi] = limbs(root);
    Commitment::from_field(&hash_fields(&[
        Fr::from(domain::HEADER),
        prev_lo,
        prev_hi,
        next_lo,
        next_hi,
        root_lo,
        root_hi,
    ]))
}

pub fn derive_nullifier(serial: &U256, randomness: &U256) -> Nullifier {
    let [serial_lo, serial_hi] = limbs(serial);
    let [r_lo, r_hi] = limbs(randomness);
    Nullifier::from_field(&hash_fields(&[
        Fr::from(domain::NULLIFIER),
        serial_lo,
        serial_hi,
        r_lo,
        r_hi,
    ]))
}

// ============================================================================
// Note types
// ============================================================================

/// A private balance
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Note {
    pub value: u64,
    #[serde(with = "hex::serde")]
    pub serial: U256,
    #[serde(with = "hex::serde")]
    pub randomness: U256,
}

impl Note {
    pub fn new(value: u64, serial: U256, randomness: U256) -> Self {
        Self {
            value,
            serial,
            randomness,
        }
    }

    /// Note with fresh serial and randomness from the OS RNG
    pub fn random(value: u64) -> Self {
        Self::new(value, random_u256(), random_u256())
    }

    pub fn commitment(&self) -> Commitment {
        commit_note(self.value, &self.serial, &self.randomness)
    }

    pub fn nullifier(&self) -> Nullifier {
        derive_nullifier(&self.serial, &self.randomness)
    }
}

/// Amount moved into the pool, bound to the serial of the note it replaces
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShieldingNote {
    pub value: u64,
    pub recipient: RecipientKeyHash,
    #[serde(with = "hex::serde")]
    pub serial: U256,
    #[serde(with = "hex::serde")]
    pub randomness: U256,
    #[serde(with = "hex::serde")]
    pub consumed_serial: U256,
}

impl ShieldingNote {
    pub fn new(
        value: u64,
        recipient: RecipientKeyHash,
        serial: U256,
        randomness: U256,
        consumed_serial: U256,
    ) -> Self {
        Self {
            value,
            recipient,
            serial,
            randomness,
            consumed_serial,
        }
    }

    /// Fresh shielding note that consumes `spent`
    pub fn random(value: u64, recipient: RecipientKeyHash, spent: &Note) -> Self {
        Self::new(value, recipient, random_u256(), random_u256(), spent.serial)
    }

    pub fn commitment(&self) -> Commitment {
        commit_shielding(
            self.value,
            &self.recipient,
            &self.serial,
            &self.randomness,
            &self.consumed_serial,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteHeader {
    #[serde(with = "hex::serde")]
    pub prev_ref: U256,
    #[serde(with = "hex::serde")]
    pub next_ref: U256,
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
}

impl NoteHeader {
    /// Header over `root` as the tree encodes it
    ///
    /// Only a canonical root can be proven in a withdraw; a header over any
    /// other encoding commits to different limbs and never verifies.
    pub fn new(prev_ref: U256, next_ref: U256, root: [u8; 32]) -> Self {
        Self {
            prev_ref,
            next_ref,
            root,
        }
    }

    pub fn commitment(&self) -> Commitment {
        commit_header(&self.prev_ref, &self.next_ref, &self.root)
    }
}
