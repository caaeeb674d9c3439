//! Keychain work-factor settings.
//!
//! The Argon2id parameters are not stored in a snapshot, so the keychain
//! that loads a snapshot must be built from the same settings as the one
//! that dumped it.  Different settings derive different keys, and `load`
//! then reports a wrong password.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{KeychainError, Result};

/// Keychain configuration, loaded from `.credvault.toml`.
///
/// Every field has a sensible default so a keychain works out-of-the-box
/// without any config file at all.  Changing a field after snapshots have
/// been written makes those snapshots unloadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for.
    pub const FILE_NAME: &'static str = ".credvault.toml";

    /// Load settings from `<dir>/.credvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        toml::from_str(&contents).map_err(|e| {
            KeychainError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
