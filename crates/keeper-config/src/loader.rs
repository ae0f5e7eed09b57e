// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keeper.toml` > `~/.config/keeper/keeper.toml` > `/etc/keeper/keeper.toml`
//! with environment variable overrides via `KEEPER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeeperConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keeper/keeper.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "keeper.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keeper/keeper.toml` (system-wide)
/// 3. `~/.config/keeper/keeper.toml` (user XDG config)
/// 4. `./keeper.toml` (local directory)
/// 5. `KEEPER_*` environment variables
pub fn load_config() -> Result<KeeperConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keeper/keeper.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `KEEPER_VAULT_KEY_FILE` must
/// map to `vault.key_file`, not `vault.key.file`.
///
/// `KEEPER_MASTER_PASSWORD` and `KEEPER_NEW_MASTER_PASSWORD` are consumed by the
/// password prompt and are never part of the configuration tree.
fn env_provider() -> Env {
    Env::prefixed("KEEPER_")
        .ignore(&["master_password", "new_master_password"])
        .map(|key| {
            let key_str = key.as_str();
            let mapped = key_str
                .replacen("vault_", "vault.", 1)
                .replacen("generator_", "generator.", 1)
                .replacen("logging_", "logging.", 1);
            mapped.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_provider_maps_sections_without_splitting_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEEPER_VAULT_KDF_MEMORY_COST", "1024");
            jail.set_env("KEEPER_GENERATOR_LENGTH", "20");
            jail.set_env("KEEPER_MASTER_PASSWORD", "never-in-config");
            jail.set_env("KEEPER_NEW_MASTER_PASSWORD", "never-in-config");

            let config: KeeperConfig = Figment::new()
                .merge(Serialized::defaults(KeeperConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.vault.kdf_memory_cost, 1024);
            assert_eq!(config.generator.length, 20);
            Ok(())
        });
    }
}
