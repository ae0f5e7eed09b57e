// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encryption directly under a human password.
//!
//! Layout: `salt(32) | packed record`. A fresh salt and nonce are drawn on
//! every encryption. The derived key lives in a [`SecretBuffer`] that is
//! zeroed when it leaves scope, on success and failure alike.

use keeper_core::KeeperError;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto::{self, Cipher};
use crate::kdf::{self, KdfParams, SALT_LEN};
use crate::wire::Reader;

const PASSWORD_LOCKED_AAD: &[u8] = b"keeper.password-locked.v1";

/// A [`Cipher`] keyed by a master password.
///
/// A wrong password surfaces as [`KeeperError::Authentication`], exactly like
/// tampered data; only the tag check tells them apart from a valid record.
pub struct PasswordLockedCipher {
    password: SecretString,
    params: KdfParams,
}

impl PasswordLockedCipher {
    pub fn new(password: SecretString, params: KdfParams) -> Self {
        Self { password, params }
    }

    /// Encrypt `plaintext` under `password` with a fresh salt.
    pub fn encrypt(
        password: &[u8],
        plaintext: &[u8],
        params: &KdfParams,
    ) -> Result<Vec<u8>, KeeperError> {
        let salt = kdf::generate_salt()?;
        let key = kdf::derive_key(password, &salt, params)?;
        let record = crypto::seal(&key, PASSWORD_LOCKED_AAD, plaintext)?;

        let mut out = Vec::with_capacity(SALT_LEN + record.len());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&record);
        Ok(out)
    }

    /// Decrypt a `salt | packed record` buffer produced by [`Self::encrypt`].
    pub fn decrypt(
        password: &[u8],
        packed: &[u8],
        params: &KdfParams,
    ) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
        let mut reader = Reader::new(packed);
        let salt = reader.take(SALT_LEN, "salt")?;
        let record = reader.rest();
        // Reject malformed framing before paying for the key derivation.
        crypto::PackedRecord::parse(record)?;

        let key = kdf::derive_key(password, salt, params)?;
        crypto::open(&key, PASSWORD_LOCKED_AAD, record)
    }
}

impl Cipher for PasswordLockedCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeeperError> {
        Self::encrypt(
            self.password.expose_secret().as_bytes(),
            plaintext,
            &self.params,
        )
    }

    fn open(&self, packed: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
        Self::decrypt(self.password.expose_secret().as_bytes(), packed, &self.params)
    }
}

impl std::fmt::Debug for PasswordLockedCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordLockedCipher")
            .field("password", &"[REDACTED]")
            .field("params", &self.params)
            .finish()
    }
}
