use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar, poseidon::constraints::PoseidonSpongeVar,
};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use zktx_core::note::{Note, ShieldingNote, U256};
use zktx_core::poseidon::{domain, limbs, poseidon_config};

/// Poseidon over `inputs` INSIDE the circuit
pub fn hash_vars(
    cs: ConstraintSystemRef<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, poseidon_config());
    for input in inputs {
        sponge.absorb(input)?;
    }
    Ok(sponge.squeeze_field_elements(1)?[0].clone())
}

/// Constrain `value` to fit in 64 bits
pub fn enforce_u64(value: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let bits = value.to_bits_le()?;
    for bit in &bits[64..] {
        bit.enforce_equal(&Boolean::constant(false))?;
    }
    Ok(())
}

/// `old + shielded == new` over 64-bit values (no wrap-around in the field)
pub fn enforce_conservation(
    old: &FpVar<Fr>,
    shielded: &FpVar<Fr>,
    new: &FpVar<Fr>,
) -> Result<(), SynthesisError> {
    enforce_u64(old)?;
    enforce_u64(shielded)?;
    enforce_u64(new)?;
    (old + shielded).enforce_equal(new)
}

/// 256-bit value as two 128-bit limbs
#[derive(Clone)]
pub struct U256Var {
    pub lo: FpVar<Fr>,
    pub hi: FpVar<Fr>,
}

impl U256Var {
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, value: &U256) -> Result<Self, SynthesisError> {
        let [lo, hi] = limbs(value);
        Ok(Self {
            lo: FpVar::new_witness(cs.clone(), || Ok(lo))?,
            hi: FpVar::new_witness(cs, || Ok(hi))?,
        })
    }

    /// Limbs of the canonical encoding of `value`
    pub fn from_fp(value: &FpVar<Fr>) -> Result<Self, SynthesisError> {
        let bits = value.to_bits_le()?;
        Ok(Self {
            lo: Boolean::le_bits_to_fp(&bits[..128])?,
            hi: Boolean::le_bits_to_fp(&bits[128..])?,
        })
    }

    pub fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        self.lo.enforce_equal(&other.lo)?;
        self.hi.enforce_equal(&other.hi)
    }
}

#[derive(Clone)]
pub struct NoteVar {
    pub value: FpVar<Fr>,
    pub serial: U256Var,
    pub randomness: U256Var,
}

impl NoteVar {
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, note: &Note) -> Result<Self, SynthesisError> {
        Ok(Self {
            value: FpVar::new_witness(cs.clone(), || Ok(Fr::from(note.value)))?,
            serial: U256Var::new_witness(cs.clone(), &note.serial)?,
            randomness: U256Var::new_witness(cs, &note.randomness)?,
        })
    }

    pub fn commitment(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        hash_vars(
            cs,
            &[
                FpVar::constant(Fr::from(domain::NOTE)),
                self.value.clone(),
                self.serial.lo.clone(),
                self.serial.hi.clone(),
                self.randomness.lo.clone(),
                self.randomness.hi.clone(),
            ],
        )
    }

    pub fn nullifier(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        hash_vars(
            cs,
            &[
                FpVar::constant(Fr::from(domain::NULLIFIER)),
                self.serial.lo.clone(),
                self.serial.hi.clone(),
                self.randomness.lo.clone(),
                self.randomness.hi.clone(),
            ],
        )
    }
}

#[derive(Clone)]
pub struct ShieldingNoteVar {
    pub value: FpVar<Fr>,
    pub recipient: FpVar<Fr>,
    pub serial: U256Var,
    pub randomness: U256Var,
    pub consumed_serial: U256Var,
}

impl ShieldingNoteVar {
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        note: &ShieldingNote,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            value: FpVar::new_witness(cs.clone(), || Ok(Fr::from(note.value)))?,
            recipient: FpVar::new_witness(cs.clone(), || Ok(note.recipient.to_field()))?,
            serial: U256Var::new_witness(cs.clone(), &note.serial)?,
            randomness: U256Var::new_witness(cs.clone(), &note.randomness)?,
            consumed_serial: U256Var::new_witness(cs, &note.consumed_serial)?,
        })
    }

    pub fn commitment(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        hash_vars(
            cs,
            &[
                FpVar::constant(Fr::from(domain::SHIELDING)),
                self.value.clone(),
                self.recipient.clone(),
                self.serial.lo.clone(),
                self.serial.hi.clone(),
                self.randomness.lo.clone(),
                self.randomness.hi.clone(),
                self.consumed_serial.lo.clone(),
                self.consumed_serial.hi.clone(),
            ],
        )
    }
}

pub fn commit_header_var(
    cs: ConstraintSystemRef<Fr>,
    prev_ref: &U256Var,
    next_ref: &U256Var,
    root: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let root = U256Var::from_fp(root)?;
    hash_vars(
        cs,
        &[
            FpVar::constant(Fr::from(domain::HEADER)),
            prev_ref.lo.clone(),
            prev_ref.hi.clone(),
            next_ref.lo.clone(),
            next_ref.hi.clone(),
            root.lo,
            root.hi,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use zktx_core::note::{NoteHeader, RecipientKeyHash};

    #[test]
    fn test_note_commitment_matches_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let note = Note::new(14, [3u8; 32], [0xfe; 32]);
        let var = NoteVar::new_witness(cs.clone(), &note).unwrap();

        let commitment = var.commitment(cs.clone()).unwrap();
        assert_eq!(commitment.value().unwrap(), note.commitment().to_field());

        let nullifier = var.nullifier(cs.clone()).unwrap();
        assert_eq!(nullifier.value().unwrap(), note.nullifier().to_field());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_shielding_and_header_match_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let note = ShieldingNote::new(8, RecipientKeyHash([0xaa; 20]), [1u8; 32], [2u8; 32], [3u8; 32]);
        let var = ShieldingNoteVar::new_witness(cs.clone(), &note).unwrap();
        assert_eq!(
            var.commitment(cs.clone()).unwrap().value().unwrap(),
            note.commitment().to_field()
        );

        let header = NoteHeader::new([4u8; 32], [5u8; 32], note.commitment().0);
        let prev = U256Var::new_witness(cs.clone(), &header.prev_ref).unwrap();
        let next = U256Var::new_witness(cs.clone(), &header.next_ref).unwrap();
        let root = FpVar::new_witness(cs.clone(), || Ok(note.commitment().to_field())).unwrap();
        let commitment = commit_header_var(cs.clone(), &prev, &next, &root).unwrap();
        assert_eq!(commitment.value().unwrap(), header.commitment().to_field());
    }

    #[test]
    fn test_root_limbs_match_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let root = Note::new(3, [9u8; 32], [0xfe; 32]).commitment();
        let var = FpVar::new_witness(cs.clone(), || Ok(root.to_field())).unwrap();
        let split = U256Var::from_fp(&var).unwrap();

        let [lo, hi] = limbs(&root.0);
        assert_eq!(split.lo.value().unwrap(), lo);
        assert_eq!(split.hi.value().unwrap(), hi);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_conservation_rejects_wraparound() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        // new = old + shielded in the field, but old is not a u64
        let old = FpVar::new_witness(cs.clone(), || Ok(-Fr::from(1u64))).unwrap();
        let shielded = FpVar::new_witness(cs.clone(), || Ok(Fr::from(2u64))).unwrap();
        let new = FpVar::new_witness(cs.clone(), || Ok(Fr::from(1u64))).unwrap();
        enforce_conservation(&old, &shielded, &new).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_conservation_accepts_u64_sum() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let old = FpVar::new_witness(cs.clone(), || Ok(Fr::from(22u64))).unwrap();
        let shielded = FpVar::new_witness(cs.clone(), || Ok(Fr::from(8u64))).unwrap();
        let new = FpVar::new_witness(cs.clone(), || Ok(Fr::from(30u64))).unwrap();
        enforce_conservation(&old, &shielded, &new).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }
}
