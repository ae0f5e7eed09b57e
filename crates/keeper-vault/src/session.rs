// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An open vault: unlocked keys plus the in-memory entry list.
//!
//! Open unlocks (or creates) the key file and then decrypts the archive with
//! the key file's archive cipher. Close writes the archive first and the key
//! file second. The archive depends only on the entry keys, so a password
//! change touches the key file alone and a failure between the two writes
//! leaves a pair that still opens with the old password.

use std::path::PathBuf;

use keeper_config::VaultConfig;
use keeper_core::KeeperError;
use secrecy::SecretString;
use tracing::{info, warn};

use crate::archive;
use crate::entry::{self, Entry};
use crate::kdf::KdfParams;
use crate::keyfile::{KeyFileManager, KeyFileState};

/// Locations of the two persisted artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    pub key_file: PathBuf,
    pub archive_file: PathBuf,
}

impl VaultPaths {
    pub fn new(key_file: impl Into<PathBuf>, archive_file: impl Into<PathBuf>) -> Self {
        Self {
            key_file: key_file.into(),
            archive_file: archive_file.into(),
        }
    }
}

impl From<&VaultConfig> for VaultPaths {
    fn from(config: &VaultConfig) -> Self {
        Self::new(&config.key_file, &config.archive_file)
    }
}

/// The single writer of one key file / archive pair.
pub struct VaultSession {
    paths: VaultPaths,
    keys: KeyFileManager,
    entries: Vec<Entry>,
}

impl VaultSession {
    /// Unlock the key file and load the archive.
    ///
    /// Blocking: key derivation is deliberately slow. A missing key file starts
    /// a fresh vault, unless an archive already exists, since that archive could
    /// never be decrypted with newly generated keys.
    pub fn open(
        paths: VaultPaths,
        password: &SecretString,
        params: KdfParams,
    ) -> Result<Self, KeeperError> {
        let mut keys = KeyFileManager::new(&paths.key_file, params);
        keys.open(password)?;

        let entries = if keys.is_new_vault() {
            if paths.archive_file.exists() {
                warn!(
                    archive = %paths.archive_file.display(),
                    key_file = %paths.key_file.display(),
                    "archive exists but key file is missing"
                );
                return Err(KeeperError::DataFormat(format!(
                    "archive {} exists but its key file {} is missing",
                    paths.archive_file.display(),
                    paths.key_file.display()
                )));
            }
            Vec::new()
        } else {
            archive::open_archive(&paths.archive_file, &keys.archive_cipher()?)?
                .unwrap_or_default()
        };

        info!(entries = entries.len(), new_vault = keys.is_new_vault(), "vault opened");
        Ok(Self {
            paths,
            keys,
            entries,
        })
    }

    pub fn state(&self) -> KeyFileState {
        self.keys.state()
    }

    /// True until the first successful close of a freshly created vault.
    pub fn is_new(&self) -> bool {
        self.keys.is_new_vault()
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by site, then account. Archive order is unchanged.
    pub fn sorted_view(&self) -> Vec<&Entry> {
        let mut view: Vec<&Entry> = self.entries.iter().collect();
        view.sort_by(|a, b| a.display_cmp(b));
        view
    }

    /// Index of the first entry for `site` (and `account`, when given).
    pub fn find(&self, site: &str, account: Option<&str>) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.site() == site && account.is_none_or(|a| e.account() == a))
    }

    /// Like [`Self::find`], but a miss is [`KeeperError::NotFound`].
    pub fn require(&self, site: &str, account: Option<&str>) -> Result<usize, KeeperError> {
        self.find(site, account).ok_or_else(|| match account {
            Some(account) => KeeperError::NotFound(format!("{account}@{site}")),
            None => KeeperError::NotFound(site.to_string()),
        })
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut Entry, KeeperError> {
        self.keys.ensure_unlocked()?;
        self.entries
            .get_mut(index)
            .ok_or_else(|| KeeperError::NotFound(format!("entry #{index}")))
    }

    /// Append an entry, optionally with a password. Returns its index.
    pub fn add_entry(
        &mut self,
        site: impl Into<String>,
        account: impl Into<String>,
        password: Option<&SecretString>,
    ) -> Result<usize, KeeperError> {
        let (site, account): (String, String) = (site.into(), account.into());
        check_names(&site, &account)?;
        let mut entry = Entry::new(site, account);
        if let Some(password) = password {
            entry.set_password(password, &self.keys.entry_cipher()?)?;
        } else {
            self.keys.ensure_unlocked()?;
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Change the site and account of an entry, keeping its password.
    pub fn update_entry(
        &mut self,
        index: usize,
        site: impl Into<String>,
        account: impl Into<String>,
    ) -> Result<(), KeeperError> {
        let (site, account): (String, String) = (site.into(), account.into());
        check_names(&site, &account)?;
        let entry = self.entry_mut(index)?;
        entry.set_site(site);
        entry.set_account(account);
        Ok(())
    }

    /// Encrypt and store a password. An empty password clears it.
    pub fn set_password(
        &mut self,
        index: usize,
        password: &SecretString,
    ) -> Result<(), KeeperError> {
        self.keys.ensure_unlocked()?;
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| KeeperError::NotFound(format!("entry #{index}")))?;
        entry.set_password(password, &self.keys.entry_cipher()?)
    }

    pub fn clear_password(&mut self, index: usize) -> Result<(), KeeperError> {
        self.entry_mut(index)?.clear_password();
        Ok(())
    }

    /// Decrypt one entry's password.
    pub fn reveal_password(&self, index: usize) -> Result<Option<SecretString>, KeeperError> {
        let cipher = self.keys.entry_cipher()?;
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| KeeperError::NotFound(format!("entry #{index}")))?;
        entry::decrypt_entry_password(entry, &cipher)
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<Entry, KeeperError> {
        self.entry_mut(index)?;
        Ok(self.entries.remove(index))
    }

    /// Persist the archive, then the key file under `password`, then destroy
    /// the keys and drop the entries.
    ///
    /// `password` may differ from the one used to open; that is how the master
    /// password is changed. On failure the session stays open and close may be
    /// retried.
    pub fn close(&mut self, password: &SecretString) -> Result<(), KeeperError> {
        archive::close_archive(
            &self.paths.archive_file,
            &self.entries,
            &self.keys.archive_cipher()?,
        )?;
        self.keys.close(password)?;
        info!(entries = self.entries.len(), "vault closed");
        self.entries.clear();
        Ok(())
    }
}

fn check_names(site: &str, account: &str) -> Result<(), KeeperError> {
    entry::check_field("site", site.len())?;
    entry::check_field("account", account.len())
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("paths", &self.paths)
            .field("state", &self.keys.state())
            .field("entries", &self.entries.len())
            .finish()
    }
}
