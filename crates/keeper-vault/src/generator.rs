// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random password generation from configurable character sets.

use keeper_config::GeneratorConfig;
use keeper_core::KeeperError;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};
use secrecy::SecretString;
use zeroize::Zeroizing;

pub const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &[u8] = b"0123456789";
pub const SYMBOLS: &[u8] = b"`~!@#$%^&*()-=_+,./<>?;':\"[]{}\\|";

/// Which character sets to draw from, and how many characters to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::from(&GeneratorConfig::default())
    }
}

impl From<&GeneratorConfig> for GeneratorOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            length: config.length,
            uppercase: config.uppercase,
            lowercase: config.lowercase,
            digits: config.digits,
            symbols: config.symbols,
        }
    }
}

impl GeneratorOptions {
    fn enabled_sets(&self) -> Vec<&'static [u8]> {
        [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter_map(|(on, set)| on.then_some(set))
        .collect()
    }
}

/// Generate a password with the OS CSPRNG.
pub fn generate_password(options: &GeneratorOptions) -> Result<SecretString, KeeperError> {
    generate_password_with(options, &mut OsRng)
}

/// Generate a password with a caller-supplied CSPRNG.
///
/// Every enabled set contributes at least one character when the length
/// allows; if it does not, each character comes from a different set.
pub fn generate_password_with<R: Rng + CryptoRng + ?Sized>(
    options: &GeneratorOptions,
    rng: &mut R,
) -> Result<SecretString, KeeperError> {
    let sets = options.enabled_sets();
    if sets.is_empty() {
        return Err(KeeperError::Config(
            "at least one character set must be enabled".to_string(),
        ));
    }
    if options.length == 0 {
        return Err(KeeperError::Config(
            "password length must be at least 1".to_string(),
        ));
    }

    let mut chars = Zeroizing::new(Vec::with_capacity(options.length));
    for set in sets.choose_multiple(rng, options.length.min(sets.len())) {
        chars.push(set[rng.gen_range(0..set.len())]);
    }

    let alphabet = sets.concat();
    while chars.len() < options.length {
        chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    chars.shuffle(rng);

    Ok(SecretString::from(
        chars.iter().map(|&b| char::from(b)).collect::<String>(),
    ))
}
