// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keeper credential vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Keeper configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeeperConfig {
    /// Key file, archive and key derivation settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Password generator character sets and length.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KeeperConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Vault file locations and key derivation cost.
///
/// The KDF parameters are not stored in the key file. Changing them after a
/// key file has been written makes that key file unopenable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Encrypted key file holding the entry key and entry auth key.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,

    /// Encrypted archive holding the credential entries.
    #[serde(default = "default_archive_file")]
    pub archive_file: PathBuf,

    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 1).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            archive_file: default_archive_file(),
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn data_home() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("keeper"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_key_file() -> PathBuf {
    data_home().join("keeper.key")
}

fn default_archive_file() -> PathBuf {
    data_home().join("keeper.archive")
}

fn default_kdf_memory_cost() -> u32 {
    65536 // 64 MiB per OWASP recommendation
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    1
}

/// Character sets and length used by the password generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Number of characters in a generated password.
    #[serde(default = "default_generator_length")]
    pub length: usize,

    /// Include `A-Z`.
    #[serde(default = "default_true")]
    pub uppercase: bool,

    /// Include `a-z`.
    #[serde(default = "default_true")]
    pub lowercase: bool,

    /// Include `0-9`.
    #[serde(default = "default_true")]
    pub digits: bool,

    /// Include punctuation.
    #[serde(default)]
    pub symbols: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: default_generator_length(),
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: false,
        }
    }
}

fn default_generator_length() -> usize {
    12
}

fn default_true() -> bool {
    true
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level for the `keeper` targets when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
