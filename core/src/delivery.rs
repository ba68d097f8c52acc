//! Shielding note delivery
//!
//! The depositor seals the opening of a shielding note to the recipient, who
//! needs it to withdraw.
//!
//! ```text
//! shared = X25519(ephemeral_sk, recipient_pk)
//! key    = BLAKE3-derive-key("zktx-note-delivery-v1", shared ‖ ephemeral_pk)
//! ct     = ChaCha20-Poly1305(key, nonce, value ‖ serial ‖ randomness ‖ consumed_serial)
//!          with the recipient key hash as associated data
//! blob   = ephemeral_pk ‖ nonce ‖ ct
//! ```

use std::fmt;

use chacha20poly1305::{
    ChaCha20Poly1305,
    aead::{Aead, KeyInit, Payload},
};
use rand_core::{OsRng, RngCore, TryRngCore};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{Error, Result};
use crate::note::{Commitment, RecipientKeyHash, ShieldingNote, U256, random_u256};

const KDF_CONTEXT: &str = "zktx-note-delivery-v1";
const KEY_HASH_CONTEXT: &str = "zktx-recipient-key-hash-v1";

/// value, serial, randomness, consumed serial
pub const PLAINTEXT_LEN: usize = 8 + 3 * 32;
/// Plaintext plus the Poly1305 tag
pub const CIPHERTEXT_LEN: usize = PLAINTEXT_LEN + 16;
pub const ENCRYPTED_NOTE_LEN: usize = 32 + 12 + CIPHERTEXT_LEN;

impl RecipientKeyHash {
    /// Key hash a shielding note names for the holder of `public_key`
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let digest = blake3::derive_key(KEY_HASH_CONTEXT, public_key);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[..20]);
        Self(out)
    }
}

/// X25519 key pair of a note recipient
#[derive(Clone)]
pub struct RecipientKeys {
    secret: StaticSecret,
    public: PublicKey,
}

impl RecipientKeys {
    pub fn random() -> Self {
        Self::from_secret(random_u256())
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    pub fn secret_key(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    pub fn key_hash(&self) -> RecipientKeyHash {
        RecipientKeyHash::from_public_key(&self.public_key())
    }
}

impl fmt::Debug for RecipientKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecipientKeys({})", hex::encode(self.public.as_bytes()))
    }
}

/// Sealed shielding note opening
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedNote {
    #[serde(with = "hex::serde")]
    pub ephemeral_pk: [u8; 32],
    #[serde(with = "hex::serde")]
    pub nonce: [u8; 12],
    #[serde(with = "hex::serde")]
    pub ciphertext: [u8; CIPHERTEXT_LEN],
}

impl EncryptedNote {
    pub fn to_bytes(&self) -> [u8; ENCRYPTED_NOTE_LEN] {
        let mut out = [0u8; ENCRYPTED_NOTE_LEN];
        out[..32].copy_from_slice(&self.ephemeral_pk);
        out[32..44].copy_from_slice(&self.nonce);
        out[44..].copy_from_slice(&self.ciphertext);
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl From<[u8; ENCRYPTED_NOTE_LEN]> for EncryptedNote {
    fn from(bytes: [u8; ENCRYPTED_NOTE_LEN]) -> Self {
        let mut ephemeral_pk = [0u8; 32];
        let mut nonce = [0u8; 12];
        let mut ciphertext = [0u8; CIPHERTEXT_LEN];
        ephemeral_pk.copy_from_slice(&bytes[..32]);
        nonce.copy_from_slice(&bytes[32..44]);
        ciphertext.copy_from_slice(&bytes[44..]);
        Self {
            ephemeral_pk,
            nonce,
            ciphertext,
        }
    }
}

fn derive_key(shared: &[u8; 32], ephemeral_pk: &[u8; 32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral_pk);
    *hasher.finalize().as_bytes()
}

fn encode_opening(note: &ShieldingNote) -> [u8; PLAINTEXT_LEN] {
    let mut out = [0u8; PLAINTEXT_LEN];
    out[..8].copy_from_slice(&note.value.to_le_bytes());
    out[8..40].copy_from_slice(&note.serial);
    out[40..72].copy_from_slice(&note.randomness);
    out[72..].copy_from_slice(&note.consumed_serial);
    out
}

fn decode_opening(bytes: &[u8], recipient: RecipientKeyHash) -> Option<ShieldingNote> {
    if bytes.len() != PLAINTEXT_LEN {
        return None;
    }
    let value = u64::from_le_bytes(bytes[..8].try_into().ok()?);
    let serial: U256 = bytes[8..40].try_into().ok()?;
    let randomness: U256 = bytes[40..72].try_into().ok()?;
    let consumed_serial: U256 = bytes[72..].try_into().ok()?;
    Some(ShieldingNote::new(
        value,
        recipient,
        serial,
        randomness,
        consumed_serial,
    ))
}

/// Seal `note` to `recipient_pk`
///
/// Only opens for the holder of `recipient_pk`, and only if `note.recipient`
/// is that key's hash.
pub fn seal(note: &ShieldingNote, recipient_pk: &[u8; 32]) -> Result<EncryptedNote> {
    let ephemeral = StaticSecret::from(random_u256());
    let ephemeral_pk = PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&PublicKey::from(*recipient_pk));
    if !shared.was_contributory() {
        return Err(Error::EncryptionFailed);
    }

    let key = derive_key(shared.as_bytes(), ephemeral_pk.as_bytes());
    let mut nonce = [0u8; 12];
    OsRng.unwrap_err().fill_bytes(&mut nonce);

    let cipher = ChaCha20Poly1305::new(&key.into());
    let sealed = cipher
        .encrypt(
            &nonce.into(),
            Payload {
                msg: &encode_opening(note),
                aad: &note.recipient.0,
            },
        )
        .map_err(|_| Error::EncryptionFailed)?;
    let ciphertext =
        <[u8; CIPHERTEXT_LEN]>::try_from(sealed.as_slice()).map_err(|_| Error::EncryptionFailed)?;

    Ok(EncryptedNote {
        ephemeral_pk: ephemeral_pk.to_bytes(),
        nonce,
        ciphertext,
    })
}

/// Recover the shielding note sealed to `keys`
pub fn open(encrypted: &EncryptedNote, keys: &RecipientKeys) -> Result<ShieldingNote> {
    let shared = keys
        .secret
        .diffie_hellman(&PublicKey::from(encrypted.ephemeral_pk));
    if !shared.was_contributory() {
        return Err(Error::DecryptionFailed);
    }

    let key = derive_key(shared.as_bytes(), &encrypted.ephemeral_pk);
    let recipient = keys.key_hash();
    let cipher = ChaCha20Poly1305::new(&key.into());
    let plaintext = cipher
        .decrypt(
            &encrypted.nonce.into(),
            Payload {
                msg: &encrypted.ciphertext,
                aad: &recipient.0,
            },
        )
        .map_err(|_| Error::DecryptionFailed)?;

    decode_opening(&plaintext, recipient).ok_or(Error::DecryptionFailed)
}

/// Scan helper: the note only if it opens and matches `expected`
pub fn try_open(
    encrypted: &EncryptedNote,
    keys: &RecipientKeys,
    expected: &Commitment,
) -> Option<ShieldingNote> {
    open(encrypted, keys)
        .ok()
        .filter(|note| note.commitment() == *expected)
}
