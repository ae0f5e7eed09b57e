// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from the master password.
//!
//! Derives a 32-byte key using Argon2id (Algorithm::Argon2id, Version::V0x13)
//! with cost parameters from [`VaultConfig`]. Salts are always 32 random bytes.

use keeper_config::VaultConfig;
use keeper_core::KeeperError;
use ring::rand::{SecureRandom, SystemRandom};

use crate::secret::SecretBuffer;

/// Length of every KDF salt, in bytes.
pub const SALT_LEN: usize = 32;

/// Length of every derived key, in bytes.
pub const DERIVED_KEY_LEN: usize = 32;

/// Argon2id cost parameters.
///
/// These are not persisted alongside the key file: a key file can only be
/// reopened with the parameters it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Number of lanes.
    pub parallelism: u32,
}

impl KdfParams {
    pub const fn new(memory_cost: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            iterations,
            parallelism,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from(&VaultConfig::default())
    }
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self::new(
            config.kdf_memory_cost,
            config.kdf_iterations,
            config.kdf_parallelism,
        )
    }
}

/// Derive a 32-byte key from `password` and a 32-byte `salt`.
///
/// Deterministic for fixed inputs. A salt of any other length is rejected as
/// [`KeeperError::DataFormat`] before any work is done.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<SecretBuffer, KeeperError> {
    if salt.len() != SALT_LEN {
        return Err(KeeperError::DataFormat(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let argon_params = argon2::Params::new(
        params.memory_cost,
        params.iterations,
        params.parallelism,
        Some(DERIVED_KEY_LEN),
    )
    .map_err(|e| KeeperError::Config(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut key = SecretBuffer::zeroed(DERIVED_KEY_LEN);
    argon2
        .hash_password_into(password, salt, key.expose_mut()?)
        .map_err(|e| KeeperError::UnsupportedSystem(format!("Argon2id key derivation failed: {e}")))?;

    Ok(key)
}

/// Generate a fresh random salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], KeeperError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| KeeperError::UnsupportedSystem("failed to generate random salt".to_string()))?;
    Ok(salt)
}
