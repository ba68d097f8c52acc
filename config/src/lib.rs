//! zktx Configuration
//!
//! Shared configuration crate for the zktx crates and binaries.
//!
//! Handles loading configuration from:
//! 1. ZKTX_CONFIG env var (explicit path)
//! 2. ./zktx.toml (current directory)
//! 3. ~/.zktx/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<ZktxConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "zktx.toml";
const HOME_CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".zktx";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_KEY_DIR: &str = "./keys";
const DEFAULT_TREE_DEPTH: usize = 16;
const DEFAULT_ROOT_HISTORY: usize = 100;

/// Deepest tree the commitment hashes support
pub const MAX_TREE_DEPTH: usize = 32;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZktxConfig {
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub tree: TreeConfig,
}

/// Which proof oracle to run with
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProverMode {
    /// In-process relation check, no zero knowledge
    #[default]
    Mock,
    Groth16,
}

/// Prover configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    #[serde(default)]
    pub mode: ProverMode,
    /// Directory holding the per-relation `.pk` / `.vk` files (see `KeyPaths`)
    #[serde(default = "default_key_dir")]
    pub key_dir: String,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            mode: ProverMode::Mock,
            key_dir: DEFAULT_KEY_DIR.into(),
        }
    }
}

fn default_key_dir() -> String {
    DEFAULT_KEY_DIR.into()
}

/// Commitment tree configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_tree_depth")]
    pub depth: usize,
    /// How many past roots a withdraw may still reference
    #[serde(default = "default_root_history")]
    pub root_history_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_TREE_DEPTH,
            root_history_size: DEFAULT_ROOT_HISTORY,
        }
    }
}

fn default_tree_depth() -> usize {
    DEFAULT_TREE_DEPTH
}
fn default_root_history() -> usize {
    DEFAULT_ROOT_HISTORY
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, field: &mut String) {
    if let Some(v) = lookup(key) {
        *field = v;
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &mut T,
) {
    if let Some(v) = lookup(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl ZktxConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check ZKTX_CONFIG env var
        if let Ok(path) = env::var("ZKTX_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("ZKTX_CONFIG points at {}, which does not exist", path.display());
        }

        // 2. Check ./zktx.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.zktx/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(&|key: &str| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        // Prover
        if let Some(v) = lookup("ZKTX_PROVER_MODE") {
            self.prover.mode = match v.to_ascii_lowercase().as_str() {
                "groth16" => ProverMode::Groth16,
                "mock" => ProverMode::Mock,
                other => {
                    log::warn!("Unknown ZKTX_PROVER_MODE {:?}, using mock", other);
                    ProverMode::Mock
                }
            };
        }
        env_string(lookup, "ZKTX_KEY_DIR", &mut self.prover.key_dir);

        // Tree
        env_parse(lookup, "ZKTX_TREE_DEPTH", &mut self.tree.depth);
        env_parse(lookup, "ZKTX_ROOT_HISTORY", &mut self.tree.root_history_size);
    }

    /// Reject settings no tree can be built with
    pub fn validate(&self) -> Result<()> {
        if self.tree.depth == 0 || self.tree.depth > MAX_TREE_DEPTH {
            bail!(
                "tree.depth must be between 1 and {}, got {}",
                MAX_TREE_DEPTH,
                self.tree.depth
            );
        }
        if self.tree.root_history_size == 0 {
            bail!("tree.root_history_size must be at least 1");
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(HOME_CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.prover.mode = ProverMode::Groth16;
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static ZktxConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Try to get the global config instance.
    ///
    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static ZktxConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: ZktxConfig) -> Result<(), ZktxConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `ZktxConfig::global()`.
#[inline]
pub fn global_config() -> &'static ZktxConfig {
    ZktxConfig::global()
}

// ============================================================================
// Tests
// ============================================================================
