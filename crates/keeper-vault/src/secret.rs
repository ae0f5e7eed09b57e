// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owned, zero-on-destroy container for key material.
//!
//! A [`SecretBuffer`] is destroyed exactly once: either explicitly through
//! [`SecretBuffer::destroy`] or implicitly when it goes out of scope. Every
//! access after an explicit destroy fails with [`KeeperError::KeyDestroyed`]
//! instead of handing out zeroed bytes.

use keeper_core::KeeperError;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Fixed-length secret bytes with checked access.
///
/// The backing allocation never grows or moves, so zeroing it reaches every
/// copy the buffer ever held. Debug output is redacted.
pub struct SecretBuffer {
    bytes: Box<[u8]>,
    destroyed: bool,
}

impl SecretBuffer {
    /// Allocate `len` zero bytes, to be filled in place (e.g. by a KDF).
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len].into_boxed_slice(),
            destroyed: false,
        }
    }

    /// Copy `bytes` into a new buffer. The caller remains responsible for the source.
    pub fn copy_from(bytes: &[u8]) -> Self {
        let mut buffer = Self::zeroed(bytes.len());
        buffer.bytes.copy_from_slice(bytes);
        buffer
    }

    /// Fill a new buffer from the system CSPRNG.
    pub fn random(len: usize) -> Result<Self, KeeperError> {
        let mut buffer = Self::zeroed(len);
        SystemRandom::new()
            .fill(&mut buffer.bytes[..])
            .map_err(|_| KeeperError::UnsupportedSystem("system CSPRNG unavailable".to_string()))?;
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Borrow the secret bytes.
    pub fn expose(&self) -> Result<&[u8], KeeperError> {
        if self.destroyed {
            return Err(KeeperError::KeyDestroyed);
        }
        Ok(&self.bytes[..])
    }

    /// Mutably borrow the secret bytes.
    pub fn expose_mut(&mut self) -> Result<&mut [u8], KeeperError> {
        if self.destroyed {
            return Err(KeeperError::KeyDestroyed);
        }
        Ok(&mut self.bytes[..])
    }

    /// Zero the buffer and mark it destroyed. A second call is an error.
    pub fn destroy(&mut self) -> Result<(), KeeperError> {
        if self.destroyed {
            return Err(KeeperError::KeyDestroyed);
        }
        self.bytes.zeroize();
        self.destroyed = true;
        Ok(())
    }

    /// Raw view of the backing memory, bypassing the destroyed check.
    #[cfg(test)]
    pub(crate) fn backing_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        if !self.destroyed {
            self.bytes.zeroize();
        }
    }
}

impl ZeroizeOnDrop for SecretBuffer {}

impl std::fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBuffer")
            .field("len", &self.bytes.len())
            .field("destroyed", &self.destroyed)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
