// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounds-checked big-endian reader and writer helpers for the packed formats.
//!
//! Every read that would run past the end of the buffer yields
//! [`KeeperError::DataFormat`].

use keeper_core::KeeperError;

/// Cursor over a borrowed byte slice.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take exactly `len` bytes describing `what`.
    pub(crate) fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], KeeperError> {
        if len > self.remaining() {
            return Err(KeeperError::DataFormat(format!(
                "{what} claims {len} bytes but only {} remain",
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Take everything that is left.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub(crate) fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], KeeperError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self, what: &str) -> Result<u8, KeeperError> {
        Ok(self.array::<1>(what)?[0])
    }

    pub(crate) fn u16(&mut self, what: &str) -> Result<u16, KeeperError> {
        Ok(u16::from_be_bytes(self.array(what)?))
    }

    pub(crate) fn u32(&mut self, what: &str) -> Result<u32, KeeperError> {
        Ok(u32::from_be_bytes(self.array(what)?))
    }
}

/// Append `bytes` preceded by their length as a big-endian `u16`.
pub(crate) fn put_u16_prefixed(
    out: &mut Vec<u8>,
    bytes: &[u8],
    what: &str,
) -> Result<(), KeeperError> {
    let len = u16::try_from(bytes.len()).map_err(|_| {
        KeeperError::DataFormat(format!(
            "{what} is {} bytes, the limit is {}",
            bytes.len(),
            u16::MAX
        ))
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}
