//! Poseidon CRH shared by the native code and the circuits
//!
//! Field: BN254 Fr (254 bits)
//! Rate: 2
//! Capacity: 1
//! Security: 128 bits
//!
//! Every 256-bit secret is absorbed as two 128-bit limbs (low half first) so
//! that distinct byte strings can never reduce to the same field element.

use std::sync::LazyLock;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    CryptographicSponge, FieldBasedCryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::{BigInt, BigInteger, PrimeField};

/// Domain tags absorbed ahead of each commitment kind
pub mod domain {
    pub const NOTE: u64 = 1;
    pub const SHIELDING: u64 = 2;
    pub const HEADER: u64 = 3;
    pub const NULLIFIER: u64 = 4;
}

static POSEIDON_CONFIG: LazyLock<PoseidonConfig<Fr>> = LazyLock::new(build_config);

/// Shared Poseidon parameters. Generated once per process.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    &POSEIDON_CONFIG
}

fn build_config() -> PoseidonConfig<Fr> {
    let full_rounds: usize = 8;
    let partial_rounds: usize = 57;
    // alpha = 5 is standard for Poseidon over large prime fields
    let alpha: u64 = 5;
    let rate: usize = 2;
    let capacity: usize = 1;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        Fr::MODULUS_BIT_SIZE as u64,
        rate,
        full_rounds as u64,
        partial_rounds as u64,
        0,
    );

    PoseidonConfig::new(full_rounds, partial_rounds, alpha, mds, ark, rate, capacity)
}

/// Absorb `inputs` in order and squeeze one element
pub fn hash_fields(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::<Fr>::new(poseidon_config());
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_native_field_elements(1)[0]
}

/// Split 32 bytes into `[low, high]` 128-bit limbs
pub fn limbs(bytes: &[u8; 32]) -> [Fr; 2] {
    [
        Fr::from_le_bytes_mod_order(&bytes[..16]),
        Fr::from_le_bytes_mod_order(&bytes[16..]),
    ]
}

/// Little-endian canonical encoding of a field element
pub fn fr_to_bytes(value: &Fr) -> [u8; 32] {
    let encoded = value.into_bigint().to_bytes_le();
    let mut out = [0u8; 32];
    out.copy_from_slice(&encoded[..32]);
    out
}

/// Inverse of [`fr_to_bytes`]; `None` when the value is not below the modulus
pub fn fr_from_canonical(bytes: &[u8; 32]) -> Option<Fr> {
    let mut words = [0u64; 4];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *word = u64::from_le_bytes(buf);
    }
    Fr::from_bigint(BigInt::new(words))
}

/// Reduce arbitrary bytes into the field (used for values that are already canonical)
pub fn fr_from_bytes(bytes: &[u8]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_roundtrip() {
        let value = Fr::from(123_456_789u64);
        let bytes = fr_to_bytes(&value);
        assert_eq!(fr_from_canonical(&bytes), Some(value));
    }

    #[test]
    fn test_rejects_non_canonical() {
        // 2^256 - 1 is far above the BN254 scalar modulus
        assert_eq!(fr_from_canonical(&[0xff; 32]), None);
    }

    #[test]
    fn test_limbs_are_injective_on_top_bit() {
        let a = [0u8; 32];
        let mut b = [0u8; 32];
        b[31] = 0x80;
        assert_ne!(limbs(&a), limbs(&b));
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let a = Fr::from(1u64);
        let b = Fr::from(2u64);
        assert_ne!(hash_fields(&[a, b]), hash_fields(&[b, a]));
        assert_eq!(hash_fields(&[a, b]), hash_fields(&[a, b]));
    }
}
