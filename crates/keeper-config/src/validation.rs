// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, Argon2id parameter bounds and generator settings.

use crate::diagnostic::ConfigError;
use crate::model::KeeperConfig;

/// Smallest Argon2id memory cost accepted (KiB).
pub const MIN_KDF_MEMORY_COST: u32 = 8192;

/// Largest password the generator will produce.
pub const MAX_GENERATOR_LENGTH: usize = 1024;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KeeperConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.vault.key_file.as_os_str().is_empty() {
        errors.push(ConfigError::Validation {
            message: "vault.key_file must not be empty".to_string(),
        });
    }

    if config.vault.archive_file.as_os_str().is_empty() {
        errors.push(ConfigError::Validation {
            message: "vault.archive_file must not be empty".to_string(),
        });
    }

    if !config.vault.key_file.as_os_str().is_empty()
        && config.vault.key_file == config.vault.archive_file
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.key_file and vault.archive_file must differ, both are `{}`",
                config.vault.key_file.display()
            ),
        });
    }

    if config.vault.kdf_memory_cost < MIN_KDF_MEMORY_COST {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.kdf_memory_cost must be at least {MIN_KDF_MEMORY_COST} (8 MiB), got {}",
                config.vault.kdf_memory_cost
            ),
        });
    }

    if config.vault.kdf_iterations < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.kdf_iterations must be at least 1, got {}",
                config.vault.kdf_iterations
            ),
        });
    }

    if config.vault.kdf_parallelism < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.kdf_parallelism must be at least 1, got {}",
                config.vault.kdf_parallelism
            ),
        });
    }

    // Argon2 requires at least 8 KiB of memory per lane.
    if config.vault.kdf_parallelism >= 1
        && u64::from(config.vault.kdf_memory_cost) < 8 * u64::from(config.vault.kdf_parallelism)
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.kdf_memory_cost ({}) must be at least 8 KiB per lane ({} lanes)",
                config.vault.kdf_memory_cost, config.vault.kdf_parallelism
            ),
        });
    }

    let generator = &config.generator;
    if generator.length == 0 || generator.length > MAX_GENERATOR_LENGTH {
        errors.push(ConfigError::Validation {
            message: format!(
                "generator.length must be between 1 and {MAX_GENERATOR_LENGTH}, got {}",
                generator.length
            ),
        });
    }

    if !(generator.uppercase || generator.lowercase || generator.digits || generator.symbols) {
        errors.push(ConfigError::Validation {
            message: "generator must enable at least one character set".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = KeeperConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_key_file_fails_validation() {
        let mut config = KeeperConfig::default();
        config.vault.key_file = PathBuf::new();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "key_file"));
    }

    #[test]
    fn identical_key_file_and_archive_fail_validation() {
        let mut config = KeeperConfig::default();
        config.vault.archive_file = config.vault.key_file.clone();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must differ"));
    }

    #[test]
    fn low_memory_cost_fails_validation() {
        let mut config = KeeperConfig::default();
        config.vault.kdf_memory_cost = 1024;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "kdf_memory_cost"));
    }

    #[test]
    fn zero_iterations_and_parallelism_fail_validation() {
        let mut config = KeeperConfig::default();
        config.vault.kdf_iterations = 0;
        config.vault.kdf_parallelism = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "kdf_iterations"));
        assert!(has_message(&errors, "kdf_parallelism"));
    }

    #[test]
    fn generator_without_character_sets_fails_validation() {
        let mut config = KeeperConfig::default();
        config.generator.uppercase = false;
        config.generator.lowercase = false;
        config.generator.digits = false;
        config.generator.symbols = false;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "character set"));
    }

    #[test]
    fn zero_length_generator_fails_validation() {
        let mut config = KeeperConfig::default();
        config.generator.length = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "generator.length"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = KeeperConfig::default();
        config.logging.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "logging.level"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = KeeperConfig::default();
        config.vault.kdf_iterations = 0;
        config.generator.length = 0;
        config.logging.level = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
