// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File reads and crash-safe replacement writes for the key file and archive.

use std::io::Write;
use std::path::Path;

use keeper_core::KeeperError;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read a whole file, treating "does not exist" as `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, KeeperError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(KeeperError::io(path, e)),
    }
}

/// Replace `path` with `bytes` via a synced sibling temp file and a rename.
///
/// If any step fails the previous contents of `path` are untouched. The temp
/// file is created owner-only on Unix and removed on failure.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), KeeperError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| KeeperError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| KeeperError::io(parent, e))?;
    tmp.write_all(bytes)
        .map_err(|e| KeeperError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| KeeperError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| KeeperError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "file replaced");
    Ok(())
}
