use serde::{Deserialize, Serialize};

use crate::error::{CoffreError, CoffreResult};

/// Top-level configuration (loaded from coffre.toml).
///
/// Persisting this file is the caller's concern; this module only defines the
/// schema and parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoffreConfig {
    pub crypto: CryptoConfig,
    pub behavior: BehaviorConfig,
}

/// Password-hashing cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

/// Post-encryption behavior flags.
///
/// No process-wide mutable toggles: the flags are read once at construction
/// time and passed into the housekeeping layer, and any runtime change is an
/// explicit new value the caller decides to keep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Replace the cleartext original with the encrypted output on success
    pub overwrite_cleartext: bool,
    /// Obfuscate output file names (rename bookkeeping happens outside the engine)
    pub obfuscate_names: bool,
}

impl CoffreConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> CoffreResult<Self> {
        toml::from_str(text).map_err(|e| CoffreError::Config(e.to_string()))
    }
}
