// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential entries and lazy per-entry password decryption.

use keeper_core::KeeperError;
use secrecy::{ExposeSecret, SecretString};

use crate::crypto::Cipher;

/// Largest site, account or password blob the archive can hold, in bytes.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Reject a field that would not fit its `u16` length prefix in the archive.
pub fn check_field(what: &str, len: usize) -> Result<(), KeeperError> {
    if len > MAX_FIELD_LEN {
        return Err(KeeperError::InvalidEntry(format!(
            "{what} is {len} bytes, the limit is {MAX_FIELD_LEN}"
        )));
    }
    Ok(())
}

/// One credential record.
///
/// The password is only ever held as a packed ciphertext blob produced by the
/// entry cipher. Use [`decrypt_entry_password`] to read it.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    site: String,
    account: String,
    password: Option<Vec<u8>>,
}

impl Entry {
    pub fn new(site: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            account: account.into(),
            password: None,
        }
    }

    pub(crate) fn from_parts(site: String, account: String, password: Option<Vec<u8>>) -> Self {
        Self {
            site,
            account,
            password,
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// The packed ciphertext of the password, if one is set.
    pub fn password_blob(&self) -> Option<&[u8]> {
        self.password.as_deref()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn set_site(&mut self, site: impl Into<String>) {
        self.site = site.into();
    }

    pub fn set_account(&mut self, account: impl Into<String>) {
        self.account = account.into();
    }

    /// Encrypt and store `password`. An empty password clears the field.
    ///
    /// A password whose sealed blob would not fit the archive is rejected and
    /// the previous blob is kept.
    pub fn set_password<C: Cipher + ?Sized>(
        &mut self,
        password: &SecretString,
        cipher: &C,
    ) -> Result<(), KeeperError> {
        let plain = password.expose_secret();
        if plain.is_empty() {
            self.password = None;
            return Ok(());
        }
        let blob = cipher.seal(plain.as_bytes())?;
        check_field("password", blob.len())?;
        self.password = Some(blob);
        Ok(())
    }

    pub fn clear_password(&mut self) {
        self.password = None;
    }

    /// Ordering used for presentation: site, then account.
    pub fn display_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.site
            .cmp(&other.site)
            .then_with(|| self.account.cmp(&other.account))
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("site", &self.site)
            .field("account", &self.account)
            .field("password", &self.password.as_ref().map(|_| "[ENCRYPTED]"))
            .finish()
    }
}

/// Decrypt an entry's password on demand.
///
/// Returns `Ok(None)` when no password is set.
pub fn decrypt_entry_password<C: Cipher + ?Sized>(
    entry: &Entry,
    cipher: &C,
) -> Result<Option<SecretString>, KeeperError> {
    let Some(blob) = entry.password_blob() else {
        return Ok(None);
    };
    let plain = cipher.open(blob)?;
    let text = std::str::from_utf8(&plain)
        .map_err(|_| KeeperError::DataFormat("entry password is not valid UTF-8".to_string()))?;
    Ok(Some(SecretString::from(text)))
}

/// Sort entries in place by site, then account.
pub fn sort_for_display(entries: &mut [Entry]) {
    entries.sort_by(Entry::display_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyfile::{EntryKeys, KeyDomain, PremadeKeyCipher};

    #[test]
    fn password_roundtrips_through_cipher() {
        let keys = EntryKeys::generate().unwrap();
        let cipher = PremadeKeyCipher::new(&keys, KeyDomain::EntryPassword);
        let mut entry = Entry::new("example.com", "alice");
        entry
            .set_password(&SecretString::from("p@ss1"), &cipher)
            .unwrap();

        assert!(entry.has_password());
        assert_ne!(entry.password_blob().unwrap(), b"p@ss1");
        let revealed = decrypt_entry_password(&entry, &cipher).unwrap().unwrap();
        assert_eq!(revealed.expose_secret(), "p@ss1");
    }

    #[test]
    fn empty_password_clears_field() {
        let keys = EntryKeys::generate().unwrap();
        let cipher = PremadeKeyCipher::new(&keys, KeyDomain::EntryPassword);
        let mut entry = Entry::new("example.com", "alice");
        entry.set_password(&SecretString::from("x"), &cipher).unwrap();
        entry.set_password(&SecretString::from(""), &cipher).unwrap();
        assert!(!entry.has_password());
        assert!(decrypt_entry_password(&entry, &cipher).unwrap().is_none());
    }

    #[test]
    fn oversized_password_keeps_previous_blob() {
        let keys = EntryKeys::generate().unwrap();
        let cipher = PremadeKeyCipher::new(&keys, KeyDomain::EntryPassword);
        let mut entry = Entry::new("example.com", "alice");
        entry.set_password(&SecretString::from("p@ss1"), &cipher).unwrap();

        let huge = SecretString::from("x".repeat(MAX_FIELD_LEN));
        assert!(matches!(
            entry.set_password(&huge, &cipher),
            Err(KeeperError::InvalidEntry(_))
        ));
        let revealed = decrypt_entry_password(&entry, &cipher).unwrap().unwrap();
        assert_eq!(revealed.expose_secret(), "p@ss1");
    }

    #[test]
    fn field_limit_matches_length_prefix() {
        assert!(check_field("site", MAX_FIELD_LEN).is_ok());
        assert!(matches!(
            check_field("site", MAX_FIELD_LEN + 1),
            Err(KeeperError::InvalidEntry(_))
        ));
    }

    #[test]
    fn sort_orders_by_site_then_account() {
        let mut entries = vec![
            Entry::new("test.org", "bob"),
            Entry::new("example.com", "zed"),
            Entry::new("example.com", "alice"),
        ];
        sort_for_display(&mut entries);
        let order: Vec<_> = entries
            .iter()
            .map(|e| (e.site(), e.account()))
            .collect();
        assert_eq!(
            order,
            [
                ("example.com", "alice"),
                ("example.com", "zed"),
                ("test.org", "bob")
            ]
        );
    }

    #[test]
    fn debug_hides_blob() {
        let keys = EntryKeys::generate().unwrap();
        let cipher = PremadeKeyCipher::new(&keys, KeyDomain::EntryPassword);
        let mut entry = Entry::new("example.com", "alice");
        entry.set_password(&SecretString::from("p@ss1"), &cipher).unwrap();
        let debug = format!("{entry:?}");
        assert!(debug.contains("[ENCRYPTED]"));
        assert!(debug.contains("example.com"));
    }
}
