use ark_bn254::Fr;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*, select::CondSelectGadget};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use zktx_core::merkle::{EMPTY_LEAF, MerklePath};
use zktx_core::poseidon::fr_from_bytes;

use super::gadgets::hash_vars;

/// Fold `leaf` up a membership path of exactly `depth` levels
///
/// The constraint count depends only on `depth`; a path of a different
/// length is padded and simply fails to reach the expected root.
pub fn root_from_path(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    path: &MerklePath,
    depth: usize,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for level in 0..depth {
        let sibling_bytes = path.siblings.get(level).copied().unwrap_or(EMPTY_LEAF);
        let sibling = FpVar::new_witness(cs.clone(), || Ok(fr_from_bytes(&sibling_bytes)))?;

        let is_right = Boolean::new_witness(cs.clone(), || {
            Ok(path.path_bits.get(level).copied().unwrap_or(false))
        })?;

        let left = FpVar::conditionally_select(&is_right, &sibling, &current)?;
        let right = FpVar::conditionally_select(&is_right, &current, &sibling)?;

        current = hash_vars(cs.clone(), &[left, right])?;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use zktx_core::merkle::IncrementalTree;
    use zktx_core::note::Note;

    #[test]
    fn test_path_matches_native_root() {
        let mut tree = IncrementalTree::with_depth(4).unwrap();
        for n in 0..5 {
            tree.append(Note::new(n, [n as u8; 32], [1u8; 32]).commitment())
                .unwrap();
        }
        let target = Note::new(99, [9u8; 32], [9u8; 32]).commitment();
        let mut witness = tree.witness();
        tree.append(target).unwrap();
        witness.append(target).unwrap();
        let path = witness.path().unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = FpVar::new_witness(cs.clone(), || Ok(target.to_field())).unwrap();
        let root = root_from_path(cs.clone(), &leaf, &path, 4).unwrap();
        assert_eq!(root.value().unwrap(), fr_from_bytes(&tree.root()));
        assert!(cs.is_satisfied().unwrap());
    }
}
