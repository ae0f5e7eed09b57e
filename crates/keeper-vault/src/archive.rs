// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archive serialization.
//!
//! The plaintext payload is a run of entry records, each
//!
//! ```text
//! u16 siteLen | site | u16 accountLen | account | u16 passwordBlobLen | passwordBlob
//! ```
//!
//! big-endian, repeated until the buffer is exhausted. A zero length means the
//! field is empty (or, for the password blob, absent). The whole payload is
//! sealed as one packed record by the top-level [`Cipher`].

use std::path::Path;

use keeper_core::KeeperError;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{Cipher, PackedRecord};
use crate::entry::Entry;
use crate::fsio;
use crate::wire::{Reader, put_u16_prefixed};

/// Serialize entries into a plaintext payload.
///
/// Any field longer than 65535 bytes is [`KeeperError::DataFormat`].
pub fn encode_entries(entries: &[Entry]) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
    let mut out = Zeroizing::new(Vec::new());
    for entry in entries {
        put_u16_prefixed(&mut out, entry.site().as_bytes(), "site")?;
        put_u16_prefixed(&mut out, entry.account().as_bytes(), "account")?;
        put_u16_prefixed(&mut out, entry.password_blob().unwrap_or_default(), "password blob")?;
    }
    Ok(out)
}

fn read_text(reader: &mut Reader<'_>, what: &str) -> Result<String, KeeperError> {
    let len = reader.u16(what)?;
    let bytes = reader.take(usize::from(len), what)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| KeeperError::DataFormat(format!("{what} is not valid UTF-8")))
}

/// Parse a plaintext payload. Any malformed record aborts the whole parse.
pub fn decode_entries(payload: &[u8]) -> Result<Vec<Entry>, KeeperError> {
    let mut reader = Reader::new(payload);
    let mut entries = Vec::new();
    while !reader.is_empty() {
        let site = read_text(&mut reader, "site")?;
        let account = read_text(&mut reader, "account")?;
        let blob_len = reader.u16("password blob")?;
        let password = match blob_len {
            0 => None,
            len => {
                let blob = reader.take(usize::from(len), "password blob")?;
                PackedRecord::parse(blob)?;
                Some(blob.to_vec())
            }
        };
        entries.push(Entry::from_parts(site, account, password));
    }
    Ok(entries)
}

/// Read, decrypt and parse the archive at `path`.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn open_archive<C: Cipher + ?Sized>(
    path: &Path,
    cipher: &C,
) -> Result<Option<Vec<Entry>>, KeeperError> {
    let Some(packed) = fsio::read_optional(path)? else {
        debug!(path = %path.display(), "no archive file");
        return Ok(None);
    };
    let payload = cipher.open(&packed)?;
    let entries = decode_entries(&payload)?;
    info!(path = %path.display(), entries = entries.len(), "archive opened");
    Ok(Some(entries))
}

/// Serialize, encrypt and atomically write `entries` to `path`.
///
/// The plaintext staging buffer is zeroed before returning.
pub fn close_archive<C: Cipher + ?Sized>(
    path: &Path,
    entries: &[Entry],
    cipher: &C,
) -> Result<(), KeeperError> {
    let payload = encode_entries(entries)?;
    let packed = cipher.seal(&payload)?;
    drop(payload);
    fsio::write_atomic(path, &packed)?;
    info!(path = %path.display(), entries = entries.len(), "archive written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyfile::{EntryKeys, KeyDomain, PremadeKeyCipher};
    use secrecy::SecretString;

    #[test]
    fn empty_payload_has_no_entries() {
        assert!(decode_entries(&[]).unwrap().is_empty());
        assert!(encode_entries(&[]).unwrap().is_empty());
    }

    #[test]
    fn payload_layout() {
        let payload = encode_entries(&[Entry::new("ab", "c")]).unwrap();
        assert_eq!(&payload[..], &[0, 2, b'a', b'b', 0, 1, b'c', 0, 0]);
    }

    #[test]
    fn zero_lengths_mean_empty_fields() {
        let entries = decode_entries(&[0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(entries, vec![Entry::new("", "")]);
        assert!(!entries[0].has_password());
    }

    #[test]
    fn entries_with_blobs_roundtrip() {
        let keys = EntryKeys::generate().unwrap();
        let cipher = PremadeKeyCipher::new(&keys, KeyDomain::EntryPassword);
        let mut first = Entry::new("example.com", "alice");
        first.set_password(&SecretString::from("p@ss1"), &cipher).unwrap();
        let entries = vec![first, Entry::new("test.org", "bob")];

        let payload = encode_entries(&entries).unwrap();
        assert_eq!(decode_entries(&payload).unwrap(), entries);
    }

    #[test]
    fn overlong_length_aborts_whole_parse() {
        let mut payload = encode_entries(&[Entry::new("one", "a")]).unwrap().to_vec();
        // Second record claims a 200-byte site with 1 byte present.
        payload.extend_from_slice(&[0, 200, b'x']);
        assert!(matches!(
            decode_entries(&payload),
            Err(KeeperError::DataFormat(_))
        ));
    }

    #[test]
    fn dangling_length_prefix_is_data_format_error() {
        assert!(matches!(
            decode_entries(&[0, 1, b'a', 0]),
            Err(KeeperError::DataFormat(_))
        ));
    }

    #[test]
    fn invalid_utf8_site_is_data_format_error() {
        assert!(matches!(
            decode_entries(&[0, 1, 0xFF, 0, 0, 0, 0]),
            Err(KeeperError::DataFormat(_))
        ));
    }

    #[test]
    fn malformed_password_blob_is_data_format_error() {
        assert!(matches!(
            decode_entries(&[0, 1, b'a', 0, 1, b'b', 0, 3, 1, 2, 3]),
            Err(KeeperError::DataFormat(_))
        ));
    }

    #[test]
    fn oversized_field_is_rejected_at_encode() {
        let entry = Entry::new("x".repeat(usize::from(u16::MAX) + 1), "a");
        assert!(matches!(
            encode_entries(&[entry]),
            Err(KeeperError::DataFormat(_))
        ));
    }

    #[test]
    fn absent_archive_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let keys = EntryKeys::generate().unwrap();
        let cipher = PremadeKeyCipher::new(&keys, KeyDomain::Archive);
        assert!(
            open_archive(&dir.path().join("keeper.archive"), &cipher)
                .unwrap()
                .is_none()
        );
    }
}
