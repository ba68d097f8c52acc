//! Key Generation CLI for the zktx circuits
//!
//! Generates Groth16 proving and verifying keys for every relation. The
//! withdraw keys are bound to one commitment tree depth.
//!
//! Usage:
//!   cargo run --package zktx-prover --bin keygen -- --key-dir ./keys --depth 16
//!
//! Note: keys must be regenerated whenever a circuit changes.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use ark_std::rand::{SeedableRng, rngs::StdRng};
use log::info;
use rand_core::{RngCore, TryRngCore};

use zktx_config::ZktxConfig;
use zktx_core::oracle::Relation;
use zktx_prover::{Groth16Oracle, KeyPaths};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ZktxConfig::load()?;
    let args: Vec<String> = std::env::args().collect();

    // Defaults come from the config file / environment
    let mut key_dir = PathBuf::from(&config.prover.key_dir);
    let mut depth = config.tree.depth;
    let mut seed: Option<u64> = None;
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--key-dir" => {
                i += 1;
                if i < args.len() {
                    key_dir = PathBuf::from(&args[i]);
                }
            }
            "--depth" => {
                i += 1;
                if i < args.len() {
                    depth = args[i]
                        .parse()
                        .with_context(|| format!("Invalid depth: {}", args[i]))?;
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    seed = Some(
                        args[i]
                            .parse()
                            .with_context(|| format!("Invalid seed: {}", args[i]))?,
                    );
                }
            }
            "--force" | "-f" => {
                force = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                bail!("unknown argument {other}");
            }
        }
        i += 1;
    }

    let paths = KeyPaths::new(&key_dir, depth);
    if !force && paths.all_exist() {
        println!("Keys for depth {} already exist in {}", depth, key_dir.display());
        println!("\nUse --force to regenerate keys.");
        return Ok(());
    }

    println!("zktx Groth16 Key Generation");
    println!("===========================");
    println!();
    println!("  Deposit public inputs:  4 (old_commitment, old_nullifier,");
    println!("                             shielding_commitment, new_commitment)");
    println!("  Withdraw public inputs: 5 (header_commitment, recipient, old_commitment,");
    println!("                             old_nullifier, new_commitment)");
    println!("  Convert/redeem inputs:  4 (old_commitment, old_nullifier,");
    println!("                             new_commitment, value)");
    println!("  Tree depth:             {}", depth);
    println!();

    let mut rng = match seed {
        Some(seed) => {
            println!("WARNING: deterministic seed; these keys are for testing only");
            StdRng::seed_from_u64(seed)
        }
        None => {
            let mut bytes = [0u8; 32];
            rand_core::OsRng.unwrap_err().fill_bytes(&mut bytes);
            StdRng::from_seed(bytes)
        }
    };

    println!("Performing Groth16 circuit-specific setup...");
    let start = Instant::now();
    let oracle =
        Groth16Oracle::setup(depth, &mut rng).context("Failed to perform circuit setup")?;
    info!("Setup complete in {:?}", start.elapsed());

    let paths = oracle
        .save(&key_dir)
        .with_context(|| format!("Failed to write keys to {}", key_dir.display()))?;

    println!();
    println!("Keys written:");
    for path in paths.all() {
        println!("  {}", path.display());
    }

    println!();
    println!("Verification key hashes (blake3):");
    for relation in Relation::ALL {
        println!(
            "  {:<8} {}",
            relation.to_string(),
            hex::encode(oracle.keys(relation).vk_hash())
        );
    }

    println!();
    println!("To use these keys, set:");
    println!("  export ZKTX_PROVER_MODE=groth16");
    println!("  export ZKTX_KEY_DIR={}", key_dir.display());
    println!("  export ZKTX_TREE_DEPTH={}", depth);

    Ok(())
}

fn print_help() {
    println!("zktx Groth16 Key Generation Tool");
    println!();
    println!("USAGE:");
    println!("    keygen [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --key-dir <PATH>   Output directory (default: prover.key_dir from config)");
    println!("    --depth <N>        Commitment tree depth (default: tree.depth from config)");
    println!("    --seed <N>         Deterministic setup seed (testing only)");
    println!("    --force, -f        Overwrite existing keys");
    println!("    --help, -h         Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    keygen --key-dir ./keys --depth 16");
    println!("    keygen -f  # Force regeneration of keys");
}
