// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keeper credential vault.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across the vault engine, configuration and CLI.
///
/// Every cryptographic failure is mapped to one of these kinds close to the
/// primitive that raised it. No variant ever carries key material or plaintext.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// A required primitive (CSPRNG, cipher, KDF) is unavailable on this host.
    #[error("unsupported system: {0}")]
    UnsupportedSystem(String),

    /// The master password did not unlock the key file.
    #[error("invalid master password")]
    InvalidPassword,

    /// Authentication tag mismatch: the data was tampered with or corrupted.
    #[error("authentication failed -- data was tampered with or is corrupted")]
    Authentication,

    /// Malformed or truncated packed data.
    #[error("malformed data: {0}")]
    DataFormat(String),

    /// Filesystem failure, with the path that failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Key material was used after it had been destroyed.
    #[error("key material has already been destroyed")]
    KeyDestroyed,

    /// A lifecycle operation was attempted in the wrong state.
    #[error("invalid state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// An entry field does not fit the archive format.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// No credential entry matched the lookup.
    #[error("no entry found for {0}")]
    NotFound(String),

    /// Invalid KDF or generator parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// The master password could not be acquired from the user.
    #[error("password prompt failed: {0}")]
    Prompt(String),

    /// A background open/close task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Background(String),
}

impl KeeperError {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller can reasonably retry or re-prompt.
    ///
    /// Missing primitives, panicked background tasks and programming errors
    /// (use-after-destroy, state machine misuse) are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedSystem(_)
                | Self::KeyDestroyed
                | Self::InvalidState { .. }
                | Self::Background(_)
        )
    }

    /// Whether this error means "the vault cannot be opened" (wrong password,
    /// tampering or corruption) as opposed to an environmental failure.
    pub fn is_cannot_open(&self) -> bool {
        matches!(
            self,
            Self::InvalidPassword | Self::Authentication | Self::DataFormat(_)
        )
    }
}
