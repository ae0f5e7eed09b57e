// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two-tier key hierarchy: master password -> key file -> entry keys.
//!
//! The key file holds two independent 256-bit keys, the entry key and the
//! entry auth key, sealed by [`PasswordLockedCipher`]. Once unlocked, those
//! keys are lent out through [`PremadeKeyCipher`] for archive and per-entry
//! password work. They are destroyed exactly once, at [`KeyFileManager::close`].

use std::path::{Path, PathBuf};

use keeper_core::KeeperError;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{self, Cipher, KEY_LEN};
use crate::fsio;
use crate::kdf::KdfParams;
use crate::password::PasswordLockedCipher;
use crate::secret::SecretBuffer;

/// Decrypted key file size: `entryKey(32) ‖ entryAuthKey(32)`.
pub const KEY_FILE_PLAINTEXT_LEN: usize = 2 * KEY_LEN;

/// Lifecycle of a [`KeyFileManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFileState {
    Uninitialized,
    Unlocking,
    Unlocked,
    Closed,
}

impl KeyFileState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Unlocking => "Unlocking",
            Self::Unlocked => "Unlocked",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for KeyFileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entry key and entry auth key of one vault.
#[derive(Debug)]
pub struct EntryKeys {
    entry_key: SecretBuffer,
    auth_key: SecretBuffer,
}

impl EntryKeys {
    /// Two independent keys from the system CSPRNG.
    pub fn generate() -> Result<Self, KeeperError> {
        Ok(Self {
            entry_key: SecretBuffer::random(KEY_LEN)?,
            auth_key: SecretBuffer::random(KEY_LEN)?,
        })
    }

    fn from_plaintext(plaintext: &[u8]) -> Result<Self, KeeperError> {
        if plaintext.len() != KEY_FILE_PLAINTEXT_LEN {
            return Err(KeeperError::DataFormat(format!(
                "key file holds {} bytes of key material, expected {KEY_FILE_PLAINTEXT_LEN}",
                plaintext.len()
            )));
        }
        let (entry, auth) = plaintext.split_at(KEY_LEN);
        Ok(Self {
            entry_key: SecretBuffer::copy_from(entry),
            auth_key: SecretBuffer::copy_from(auth),
        })
    }

    fn to_plaintext(&self) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
        let mut out = Zeroizing::new(Vec::with_capacity(KEY_FILE_PLAINTEXT_LEN));
        out.extend_from_slice(self.entry_key.expose()?);
        out.extend_from_slice(self.auth_key.expose()?);
        Ok(out)
    }

    /// Zero both keys. Both are attempted even if the first was already gone.
    pub fn destroy(&mut self) -> Result<(), KeeperError> {
        let entry = self.entry_key.destroy();
        let auth = self.auth_key.destroy();
        entry.and(auth)
    }

    pub fn is_destroyed(&self) -> bool {
        self.entry_key.is_destroyed() && self.auth_key.is_destroyed()
    }

    #[cfg(test)]
    pub(crate) fn backing_bytes(&self) -> (&[u8], &[u8]) {
        (self.entry_key.backing_bytes(), self.auth_key.backing_bytes())
    }
}

/// What a [`PremadeKeyCipher`] is protecting. Records sealed for one domain
/// do not open in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDomain {
    EntryPassword,
    Archive,
}

impl KeyDomain {
    fn label(self) -> &'static [u8] {
        match self {
            Self::EntryPassword => b"keeper.entry-password.v1",
            Self::Archive => b"keeper.archive.v1",
        }
    }
}

/// AES-256-GCM under the entry key, authenticated against the entry auth
/// key and a domain label.
#[derive(Debug, Clone, Copy)]
pub struct PremadeKeyCipher<'a> {
    keys: &'a EntryKeys,
    domain: KeyDomain,
}

impl<'a> PremadeKeyCipher<'a> {
    pub fn new(keys: &'a EntryKeys, domain: KeyDomain) -> Self {
        Self { keys, domain }
    }

    fn aad(&self) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
        let label = self.domain.label();
        let auth = self.keys.auth_key.expose()?;
        let mut aad = Zeroizing::new(Vec::with_capacity(label.len() + auth.len()));
        aad.extend_from_slice(label);
        aad.extend_from_slice(auth);
        Ok(aad)
    }
}

impl Cipher for PremadeKeyCipher<'_> {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeeperError> {
        crypto::seal(&self.keys.entry_key, &self.aad()?, plaintext)
    }

    fn open(&self, packed: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
        crypto::open(&self.keys.entry_key, &self.aad()?, packed)
    }
}

/// Owns the key file and the keys it protects for one session.
pub struct KeyFileManager {
    path: PathBuf,
    params: KdfParams,
    state: KeyFileState,
    keys: Option<EntryKeys>,
    new_vault: bool,
}

impl KeyFileManager {
    pub fn new(path: impl Into<PathBuf>, params: KdfParams) -> Self {
        Self {
            path: path.into(),
            params,
            state: KeyFileState::Uninitialized,
            keys: None,
            new_vault: false,
        }
    }

    pub fn state(&self) -> KeyFileState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the last successful open found no key file and generated keys.
    pub fn is_new_vault(&self) -> bool {
        self.new_vault
    }

    fn expect_state(&self, expected: KeyFileState) -> Result<(), KeeperError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(KeeperError::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            })
        }
    }

    /// Unlock the key file, or generate fresh keys if it does not exist.
    ///
    /// A wrong password is [`KeeperError::InvalidPassword`]. On any failure the
    /// manager returns to `Uninitialized` holding no key material.
    pub fn open(&mut self, password: &SecretString) -> Result<(), KeeperError> {
        self.expect_state(KeyFileState::Uninitialized)?;
        self.state = KeyFileState::Unlocking;

        match self.load_keys(password) {
            Ok((keys, new_vault)) => {
                self.keys = Some(keys);
                self.new_vault = new_vault;
                self.state = KeyFileState::Unlocked;
                info!(path = %self.path.display(), new_vault, "key file unlocked");
                Ok(())
            }
            Err(e) => {
                self.state = KeyFileState::Uninitialized;
                Err(e)
            }
        }
    }

    fn load_keys(&self, password: &SecretString) -> Result<(EntryKeys, bool), KeeperError> {
        let Some(packed) = fsio::read_optional(&self.path)? else {
            debug!(path = %self.path.display(), "no key file, generating entry keys");
            return Ok((EntryKeys::generate()?, true));
        };

        let plaintext = PasswordLockedCipher::decrypt(
            password.expose_secret().as_bytes(),
            &packed,
            &self.params,
        )
        .map_err(|e| match e {
            KeeperError::Authentication => KeeperError::InvalidPassword,
            other => other,
        })?;
        Ok((EntryKeys::from_plaintext(&plaintext)?, false))
    }

    fn unlocked_keys(&self) -> Result<&EntryKeys, KeeperError> {
        self.expect_state(KeyFileState::Unlocked)?;
        self.keys.as_ref().ok_or(KeeperError::KeyDestroyed)
    }

    pub(crate) fn ensure_unlocked(&self) -> Result<(), KeeperError> {
        self.unlocked_keys().map(|_| ())
    }

    /// Cipher for per-entry password blobs.
    pub fn entry_cipher(&self) -> Result<PremadeKeyCipher<'_>, KeeperError> {
        Ok(PremadeKeyCipher::new(
            self.unlocked_keys()?,
            KeyDomain::EntryPassword,
        ))
    }

    /// Cipher for the archive body.
    pub fn archive_cipher(&self) -> Result<PremadeKeyCipher<'_>, KeeperError> {
        Ok(PremadeKeyCipher::new(self.unlocked_keys()?, KeyDomain::Archive))
    }

    /// Re-seal the keys under `password` (possibly a new one), replace the key
    /// file atomically, then destroy the keys.
    ///
    /// If the write fails the manager stays `Unlocked` and `close` may be retried.
    pub fn close(&mut self, password: &SecretString) -> Result<(), KeeperError> {
        let plaintext = self.unlocked_keys()?.to_plaintext()?;
        let packed = PasswordLockedCipher::encrypt(
            password.expose_secret().as_bytes(),
            &plaintext,
            &self.params,
        )?;
        drop(plaintext);
        fsio::write_atomic(&self.path, &packed)?;

        if let Some(keys) = self.keys.as_mut() {
            keys.destroy()?;
        }
        self.state = KeyFileState::Closed;
        self.new_vault = false;
        info!(path = %self.path.display(), "key file written, keys destroyed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn keys_for_inspection(&self) -> Option<&EntryKeys> {
        self.keys.as_ref()
    }
}

impl std::fmt::Debug for KeyFileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFileManager")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("keys", &self.keys.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PARAMS: KdfParams = KdfParams::new(256, 1, 1);

    fn pw(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[test]
    fn missing_key_file_creates_fresh_vault() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = KeyFileManager::new(dir.path().join("keeper.key"), TEST_PARAMS);
        assert_eq!(manager.state(), KeyFileState::Uninitialized);

        manager.open(&pw("master")).unwrap();
        assert_eq!(manager.state(), KeyFileState::Unlocked);
        assert!(manager.is_new_vault());
        assert!(!manager.path().exists());
    }

    #[test]
    fn generated_keys_are_independent() {
        let keys = EntryKeys::generate().unwrap();
        assert_ne!(keys.entry_key.expose().unwrap(), keys.auth_key.expose().unwrap());
    }

    #[test]
    fn close_then_reopen_recovers_same_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.key");

        let mut first = KeyFileManager::new(&path, TEST_PARAMS);
        first.open(&pw("master")).unwrap();
        let blob = first.entry_cipher().unwrap().seal(b"p@ss1").unwrap();
        first.close(&pw("master")).unwrap();
        assert_eq!(first.state(), KeyFileState::Closed);

        let mut second = KeyFileManager::new(&path, TEST_PARAMS);
        second.open(&pw("master")).unwrap();
        assert!(!second.is_new_vault());
        let opened = second.entry_cipher().unwrap().open(&blob).unwrap();
        assert_eq!(&opened[..], b"p@ss1");
    }

    #[test]
    fn wrong_password_is_invalid_password_and_resets_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.key");
        let mut manager = KeyFileManager::new(&path, TEST_PARAMS);
        manager.open(&pw("right")).unwrap();
        manager.close(&pw("right")).unwrap();

        let mut again = KeyFileManager::new(&path, TEST_PARAMS);
        let err = again.open(&pw("wrong")).unwrap_err();
        assert!(matches!(err, KeeperError::InvalidPassword));
        assert_eq!(again.state(), KeyFileState::Uninitialized);
        assert!(again.keys_for_inspection().is_none());

        // The same manager can retry with the right password.
        again.open(&pw("right")).unwrap();
        assert_eq!(again.state(), KeyFileState::Unlocked);
    }

    #[test]
    fn key_file_with_wrong_plaintext_length_is_data_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.key");
        let packed = PasswordLockedCipher::encrypt(b"pw", &[7u8; 48], &TEST_PARAMS).unwrap();
        std::fs::write(&path, packed).unwrap();

        let mut manager = KeyFileManager::new(&path, TEST_PARAMS);
        assert!(matches!(
            manager.open(&pw("pw")),
            Err(KeeperError::DataFormat(_))
        ));
    }

    #[test]
    fn close_zeroes_keys_and_blocks_further_use() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = KeyFileManager::new(dir.path().join("keeper.key"), TEST_PARAMS);
        manager.open(&pw("master")).unwrap();
        manager.close(&pw("master")).unwrap();

        let keys = manager.keys_for_inspection().unwrap();
        assert!(keys.is_destroyed());
        let (entry, auth) = keys.backing_bytes();
        assert!(entry.iter().chain(auth).all(|&b| b == 0));

        assert!(matches!(
            manager.entry_cipher(),
            Err(KeeperError::InvalidState { actual: "Closed", .. })
        ));
        assert!(matches!(
            manager.close(&pw("master")),
            Err(KeeperError::InvalidState { .. })
        ));
        assert!(matches!(
            manager.open(&pw("master")),
            Err(KeeperError::InvalidState { .. })
        ));
    }

    #[test]
    fn cipher_before_open_is_invalid_state() {
        let manager = KeyFileManager::new("/nonexistent/keeper.key", TEST_PARAMS);
        assert!(matches!(
            manager.archive_cipher(),
            Err(KeeperError::InvalidState {
                expected: "Unlocked",
                actual: "Uninitialized"
            })
        ));
    }

    #[test]
    fn failed_write_keeps_manager_unlocked() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the key file should be makes the rename fail.
        let path = dir.path().join("keeper.key");
        let mut manager = KeyFileManager::new(&path, TEST_PARAMS);
        manager.open(&pw("master")).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"x").unwrap();

        assert!(matches!(
            manager.close(&pw("master")),
            Err(KeeperError::Io { .. })
        ));
        assert_eq!(manager.state(), KeyFileState::Unlocked);
        assert!(manager.entry_cipher().is_ok());
    }

    #[test]
    fn domains_are_not_interchangeable() {
        let keys = EntryKeys::generate().unwrap();
        let entry = PremadeKeyCipher::new(&keys, KeyDomain::EntryPassword);
        let archive = PremadeKeyCipher::new(&keys, KeyDomain::Archive);
        let blob = entry.seal(b"secret").unwrap();
        assert!(matches!(archive.open(&blob), Err(KeeperError::Authentication)));
    }

    #[test]
    fn auth_key_participates_in_verification() {
        let keys = EntryKeys::generate().unwrap();
        let blob = PremadeKeyCipher::new(&keys, KeyDomain::Archive)
            .seal(b"body")
            .unwrap();

        // Same entry key, different auth key.
        let mut plaintext = keys.to_plaintext().unwrap();
        plaintext[KEY_LEN] ^= 0xFF;
        let altered = EntryKeys::from_plaintext(&plaintext).unwrap();
        assert!(matches!(
            PremadeKeyCipher::new(&altered, KeyDomain::Archive).open(&blob),
            Err(KeeperError::Authentication)
        ));
    }

    #[test]
    fn debug_output_is_redacted() {
        let keys = EntryKeys::generate().unwrap();
        let debug = format!("{keys:?}");
        assert!(debug.contains("REDACTED"));
    }
}
