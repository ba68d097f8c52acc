//! Typed hex decoding for boundary inputs
//!
//! Every 256-bit value is `0x` + 64 hex digits of its 32-byte little-endian
//! encoding; a recipient key hash is `0x` + 40 digits.

use crate::delivery::{ENCRYPTED_NOTE_LEN, EncryptedNote};
use crate::error::ValidationError;
use crate::note::{Commitment, Nullifier, RecipientKeyHash, U256};
use crate::poseidon::fr_from_canonical;

/// Characters in one `0x`-prefixed 256-bit token
pub const HEX_TOKEN_LEN: usize = 66;

fn strip<'a>(input: &'a str, field: &'static str, digits: usize) -> Result<&'a str, ValidationError> {
    let body = input
        .strip_prefix("0x")
        .ok_or(ValidationError::MissingPrefix { field })?;
    if body.len() != digits {
        return Err(ValidationError::Length {
            field,
            expected: digits,
            got: body.len(),
        });
    }
    Ok(body)
}

fn decode_fixed<const N: usize>(input: &str, field: &'static str) -> Result<[u8; N], ValidationError> {
    let body = strip(input, field, N * 2)?;
    let mut out = [0u8; N];
    hex::decode_to_slice(body, &mut out).map_err(|_| ValidationError::InvalidHex { field })?;
    Ok(out)
}

/// Any 256-bit value (serials, randomness, header links)
pub fn decode_u256(input: &str, field: &'static str) -> Result<U256, ValidationError> {
    decode_fixed::<32>(input, field)
}

/// 256-bit value that must be a canonical field element (roots)
pub fn decode_field_bytes(input: &str, field: &'static str) -> Result<[u8; 32], ValidationError> {
    let bytes = decode_u256(input, field)?;
    match fr_from_canonical(&bytes) {
        Some(_) => Ok(bytes),
        None => Err(ValidationError::NonCanonical { field }),
    }
}

pub fn decode_commitment(input: &str, field: &'static str) -> Result<Commitment, ValidationError> {
    decode_field_bytes(input, field).map(Commitment)
}

pub fn decode_nullifier(input: &str, field: &'static str) -> Result<Nullifier, ValidationError> {
    decode_field_bytes(input, field).map(Nullifier)
}

pub fn decode_recipient(input: &str, field: &'static str) -> Result<RecipientKeyHash, ValidationError> {
    decode_fixed::<20>(input, field).map(RecipientKeyHash)
}

/// `ephemeral_pk ‖ nonce ‖ ciphertext` as one hex token
pub fn decode_encrypted_note(input: &str, field: &'static str) -> Result<EncryptedNote, ValidationError> {
    decode_fixed::<ENCRYPTED_NOTE_LEN>(input, field).map(EncryptedNote::from)
}

/// Split `count` back-to-back tokens with no delimiter
pub fn decode_commitment_blob(blob: &str, count: usize) -> Result<Vec<Commitment>, ValidationError> {
    let expected = count
        .checked_mul(HEX_TOKEN_LEN)
        .ok_or(ValidationError::CountOutOfRange {
            count,
            max: (usize::MAX / HEX_TOKEN_LEN) as u64,
        })?;
    if blob.len() != expected {
        return Err(ValidationError::BlobLength {
            count,
            expected,
            got: blob.len(),
        });
    }
    // Byte slicing below must land on char boundaries
    if !blob.is_ascii() {
        return Err(ValidationError::InvalidHex {
            field: "commitments",
        });
    }

    (0..count)
        .map(|index| {
            let start = index * HEX_TOKEN_LEN;
            decode_commitment(&blob[start..start + HEX_TOKEN_LEN], "commitments")
        })
        .collect()
}

pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
