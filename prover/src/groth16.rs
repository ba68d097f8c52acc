//! Groth16 proof oracle over BN254
//!
//! One key pair per relation. The withdraw keys are specific to the tree
//! depth they were generated for, so their files carry the depth in the name:
//!
//! ```text
//! <key_dir>/deposit.{pk,vk}
//! <key_dir>/withdraw_d<depth>.{pk,vk}
//! <key_dir>/convert.{pk,vk}
//! <key_dir>/redeem.{pk,vk}
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, Proof as Groth16Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::ConstraintSynthesizer;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore, SeedableRng, rngs::StdRng};
use log::{info, warn};
use rand_core::{RngCore as _, TryRngCore as _};

use zktx_core::merkle::MAX_DEPTH;
use zktx_core::oracle::relation::first_violation;
use zktx_core::oracle::{PrivateWitness, Proof, ProofOracle, PublicInputs, Relation, VerificationKey};

use zktx_core::protocol::BalanceKind;

use crate::circuit::{BalanceCircuit, DepositCircuit, WithdrawCircuit};
use crate::error::{ProverError, Result};

/// Proving and verifying key for one relation
pub struct CircuitKeys {
    pk: ProvingKey<Bn254>,
    vk: VerifyingKey<Bn254>,
    vk_bytes: Vec<u8>,
}

impl CircuitKeys {
    fn setup<C, R>(circuit: C, rng: &mut R) -> Result<Self>
    where
        C: ConstraintSynthesizer<ark_bn254::Fr>,
        R: RngCore + CryptoRng,
    {
        let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)?;
        Self::from_keys(pk, vk)
    }

    fn from_keys(pk: ProvingKey<Bn254>, vk: VerifyingKey<Bn254>) -> Result<Self> {
        let mut vk_bytes = Vec::new();
        vk.serialize_compressed(&mut vk_bytes)?;
        Ok(Self { pk, vk, vk_bytes })
    }

    fn from_bytes(pk_bytes: &[u8], vk_bytes: &[u8]) -> Result<Self> {
        let pk = ProvingKey::<Bn254>::deserialize_compressed(pk_bytes)?;
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(vk_bytes)?;
        Self::from_keys(pk, vk)
    }

    fn pk_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.pk.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.vk
    }

    /// BLAKE3 of the compressed verifying key
    pub fn vk_hash(&self) -> [u8; 32] {
        *blake3::hash(&self.vk_bytes).as_bytes()
    }
}

/// Locations of the key files for one depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    dir: PathBuf,
    depth: usize,
}

impl KeyPaths {
    pub fn new(dir: &Path, depth: usize) -> Self {
        Self {
            dir: dir.to_path_buf(),
            depth,
        }
    }

    fn stem(&self, relation: Relation) -> String {
        match relation {
            Relation::Withdraw => format!("withdraw_d{}", self.depth),
            other => other.as_str().to_string(),
        }
    }

    pub fn pk(&self, relation: Relation) -> PathBuf {
        self.dir.join(format!("{}.pk", self.stem(relation)))
    }

    pub fn vk(&self, relation: Relation) -> PathBuf {
        self.dir.join(format!("{}.vk", self.stem(relation)))
    }

    /// Every key file, proving key first for each relation
    pub fn all(&self) -> Vec<PathBuf> {
        Relation::ALL
            .into_iter()
            .flat_map(|relation| [self.pk(relation), self.vk(relation)])
            .collect()
    }

    pub fn all_exist(&self) -> bool {
        self.all().iter().all(|path| path.exists())
    }
}

fn read_key(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ProverError::KeyIo {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn write_key(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| ProverError::KeyIo {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn check_depth(depth: usize) -> Result<()> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(ProverError::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(())
}

/// Fresh proving randomness from the OS
fn proving_rng() -> StdRng {
    let mut seed = [0u8; 32];
    rand_core::OsRng.unwrap_err().fill_bytes(&mut seed);
    StdRng::from_seed(seed)
}

/// Real zero-knowledge backend for every [`Relation`]
pub struct Groth16Oracle {
    depth: usize,
    /// Indexed by [`Relation::index`]
    keys: [CircuitKeys; 4],
}

impl Groth16Oracle {
    /// Circuit-specific setup for all relations
    ///
    /// Whoever holds `rng` can forge proofs; production keys come from a
    /// setup ceremony, not from this call.
    pub fn setup<R: RngCore + CryptoRng>(depth: usize, rng: &mut R) -> Result<Self> {
        check_depth(depth)?;
        let start = Instant::now();

        let keys = [
            CircuitKeys::setup(DepositCircuit::blank(), rng)?,
            CircuitKeys::setup(WithdrawCircuit::blank(depth), rng)?,
            CircuitKeys::setup(BalanceCircuit::blank(BalanceKind::Convert), rng)?,
            CircuitKeys::setup(BalanceCircuit::blank(BalanceKind::Redeem), rng)?,
        ];

        info!(
            "Groth16 setup for tree depth {} complete in {:?}",
            depth,
            start.elapsed()
        );
        Ok(Self { depth, keys })
    }

    /// `(pk, vk)` bytes per relation, in [`Relation::ALL`] order
    pub fn from_bytes(depth: usize, keys: [(&[u8], &[u8]); 4]) -> Result<Self> {
        check_depth(depth)?;
        let [deposit, withdraw, convert, redeem] = keys;
        Ok(Self {
            depth,
            keys: [
                CircuitKeys::from_bytes(deposit.0, deposit.1)?,
                CircuitKeys::from_bytes(withdraw.0, withdraw.1)?,
                CircuitKeys::from_bytes(convert.0, convert.1)?,
                CircuitKeys::from_bytes(redeem.0, redeem.1)?,
            ],
        })
    }

    /// Load the keys for `depth` from `dir`
    pub fn load(dir: &Path, depth: usize) -> Result<Self> {
        let paths = KeyPaths::new(dir, depth);
        let mut files = Vec::with_capacity(Relation::ALL.len());
        for relation in Relation::ALL {
            files.push((read_key(&paths.pk(relation))?, read_key(&paths.vk(relation))?));
        }
        let oracle = Self::from_bytes(
            depth,
            std::array::from_fn(|i| (files[i].0.as_slice(), files[i].1.as_slice())),
        )?;
        info!(
            "Loaded Groth16 keys for tree depth {} from {}",
            depth,
            dir.display()
        );
        Ok(oracle)
    }

    /// Write every key file into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<KeyPaths> {
        fs::create_dir_all(dir).map_err(|e| ProverError::KeyIo {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let paths = KeyPaths::new(dir, self.depth);
        for relation in Relation::ALL {
            let keys = self.keys(relation);
            write_key(&paths.pk(relation), &keys.pk_bytes()?)?;
            write_key(&paths.vk(relation), &keys.vk_bytes)?;
        }
        Ok(paths)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn keys(&self, relation: Relation) -> &CircuitKeys {
        &self.keys[relation.index()]
    }
}

impl ProofOracle for Groth16Oracle {
    fn verification_key(&self, relation: Relation) -> zktx_core::Result<VerificationKey> {
        Ok(VerificationKey {
            relation,
            bytes: self.keys(relation).vk_bytes.clone(),
        })
    }

    fn generate_proof(
        &self,
        public: &PublicInputs,
        witness: &PrivateWitness,
    ) -> zktx_core::Result<Proof> {
        let relation = public.relation();
        if let Some(violation) = first_violation(public, witness)? {
            warn!("Groth16 {relation} proof refused: {violation}");
            return Err(zktx_core::Error::Unsatisfied);
        }

        let start = Instant::now();
        let mut rng = proving_rng();
        let pk = &self.keys(relation).pk;
        let proof = match (public, witness) {
            (PublicInputs::Deposit(public), PrivateWitness::Deposit(witness)) => {
                let circuit = DepositCircuit::new(public.clone(), witness.clone());
                Groth16::<Bn254>::prove(pk, circuit, &mut rng)
            }
            (PublicInputs::Withdraw(public), PrivateWitness::Withdraw(witness)) => {
                if witness.path.depth() != self.depth {
                    warn!(
                        "Groth16 withdraw proof refused: path depth {} but keys are for depth {}",
                        witness.path.depth(),
                        self.depth
                    );
                    return Err(zktx_core::Error::Unsatisfied);
                }
                let circuit = WithdrawCircuit::new(public.clone(), witness.clone(), self.depth);
                Groth16::<Bn254>::prove(pk, circuit, &mut rng)
            }
            (PublicInputs::Convert(public), PrivateWitness::Convert(witness)) => {
                let circuit =
                    BalanceCircuit::new(BalanceKind::Convert, public.clone(), witness.clone());
                Groth16::<Bn254>::prove(pk, circuit, &mut rng)
            }
            (PublicInputs::Redeem(public), PrivateWitness::Redeem(witness)) => {
                let circuit =
                    BalanceCircuit::new(BalanceKind::Redeem, public.clone(), witness.clone());
                Groth16::<Bn254>::prove(pk, circuit, &mut rng)
            }
            _ => return Err(zktx_core::Error::RelationMismatch),
        }
        .map_err(ProverError::from)?;

        let mut bytes = Vec::new();
        proof
            .serialize_compressed(&mut bytes)
            .map_err(ProverError::from)?;

        info!(
            "Generated Groth16 {} proof: {} bytes in {:?}",
            relation,
            bytes.len(),
            start.elapsed()
        );
        Ok(Proof { relation, bytes })
    }

    fn verify_proof(&self, vk: &VerificationKey, public: &PublicInputs, proof: &Proof) -> bool {
        let relation = public.relation();
        if vk.relation != relation || proof.relation != relation {
            return false;
        }
        let Ok(vk) = VerifyingKey::<Bn254>::deserialize_compressed(vk.bytes.as_slice()) else {
            return false;
        };
        let Ok(proof) = Groth16Proof::<Bn254>::deserialize_compressed(proof.bytes.as_slice())
        else {
            return false;
        };
        Groth16::<Bn254>::verify(&vk, &public.to_field_elements(), &proof).unwrap_or(false)
    }
}
