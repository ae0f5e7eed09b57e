// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM seal/open over a self-describing packed record.
//!
//! Every call to [`seal`] draws a fresh random 96-bit nonce from the system
//! CSPRNG. Nonce reuse under one key would break GCM entirely.
//!
//! Packed record layout:
//!
//! ```text
//! nonce(12) | tagLen(1) = 16 | tag(16) | ciphertextLen(u32 BE) | ciphertext
//! ```

use keeper_core::KeeperError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::secret::SecretBuffer;
use crate::wire::Reader;

/// AES-256 key length, in bytes.
pub const KEY_LEN: usize = 32;

/// GCM nonce length, in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM tag length, in bytes.
pub const TAG_LEN: usize = 16;

/// Bytes of framing around the ciphertext.
pub const RECORD_OVERHEAD: usize = NONCE_LEN + 1 + TAG_LEN + 4;

/// Something that turns plaintext into a packed record and back.
///
/// Implemented by the password-locked cipher (key file) and the premade-key
/// cipher (archive and entry passwords), so callers need not know which one
/// protects a given artifact.
pub trait Cipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeeperError>;

    /// Plaintext is only returned after the tag has been verified.
    fn open(&self, packed: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeeperError>;
}

/// Borrowed view of a parsed packed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRecord<'a> {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: &'a [u8],
}

impl<'a> PackedRecord<'a> {
    /// Parse and bounds-check a packed record. Trailing bytes are rejected.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, KeeperError> {
        let mut reader = Reader::new(bytes);
        let nonce = reader.array::<NONCE_LEN>("nonce")?;
        let tag_len = reader.u8("tag length")?;
        if usize::from(tag_len) != TAG_LEN {
            return Err(KeeperError::DataFormat(format!(
                "unexpected tag length {tag_len}, expected {TAG_LEN}"
            )));
        }
        let tag = reader.array::<TAG_LEN>("tag")?;
        let ct_len = reader.u32("ciphertext length")? as usize;
        if ct_len != reader.remaining() {
            return Err(KeeperError::DataFormat(format!(
                "ciphertext length field says {ct_len} bytes, record holds {}",
                reader.remaining()
            )));
        }
        Ok(Self {
            nonce,
            tag,
            ciphertext: reader.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RECORD_OVERHEAD + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.push(TAG_LEN as u8);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&(self.ciphertext.len() as u32).to_be_bytes());
        out.extend_from_slice(self.ciphertext);
        out
    }
}

fn aead_key(key: &SecretBuffer) -> Result<LessSafeKey, KeeperError> {
    let bytes = key.expose()?;
    if bytes.len() != KEY_LEN {
        return Err(KeeperError::DataFormat(format!(
            "cipher key must be {KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let unbound = UnboundKey::new(&AES_256_GCM, bytes)
        .map_err(|_| KeeperError::UnsupportedSystem("AES-256-GCM is unavailable".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key`, binding `aad`, into a packed record.
pub fn seal(key: &SecretBuffer, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, KeeperError> {
    if u32::try_from(plaintext.len()).is_err() {
        return Err(KeeperError::DataFormat(format!(
            "plaintext of {} bytes does not fit a packed record",
            plaintext.len()
        )));
    }
    let aead = aead_key(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| KeeperError::UnsupportedSystem("failed to generate random nonce".to_string()))?;

    // The staging buffer holds plaintext until sealing overwrites it.
    let mut in_out = Zeroizing::new(plaintext.to_vec());
    let tag = aead
        .seal_in_place_separate_tag(
            Nonce::assume_unique_for_key(nonce),
            Aad::from(aad),
            &mut in_out[..],
        )
        .map_err(|_| KeeperError::UnsupportedSystem("AES-256-GCM encryption failed".to_string()))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_ref());

    Ok(PackedRecord {
        nonce,
        tag: tag_bytes,
        ciphertext: &in_out[..],
    }
    .encode())
}

/// Verify and decrypt a packed record.
///
/// A tag mismatch yields [`KeeperError::Authentication`]; the working buffer
/// is zeroed before the error is returned.
pub fn open(
    key: &SecretBuffer,
    aad: &[u8],
    packed: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
    let record = PackedRecord::parse(packed)?;
    let aead = aead_key(key)?;

    let mut in_out = Zeroizing::new(Vec::with_capacity(record.ciphertext.len() + TAG_LEN));
    in_out.extend_from_slice(record.ciphertext);
    in_out.extend_from_slice(&record.tag);

    let plaintext_len = aead
        .open_in_place(
            Nonce::assume_unique_for_key(record.nonce),
            Aad::from(aad),
            &mut in_out[..],
        )
        .map_err(|_| KeeperError::Authentication)?
        .len();
    in_out.truncate(plaintext_len);
    Ok(in_out)
}
