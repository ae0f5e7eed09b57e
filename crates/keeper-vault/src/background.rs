// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run the slow open/close calls off the caller's thread.
//!
//! The blocking work goes to tokio's blocking pool. A [`BusyIndicator`] is
//! shown for the duration and hidden by a drop guard, so it is hidden even if
//! the awaiting future is cancelled.

use keeper_core::KeeperError;
use secrecy::SecretString;
use thiserror::Error;
use tracing::error;

use crate::kdf::KdfParams;
use crate::session::{VaultPaths, VaultSession};

/// "Show busy" / "hide busy" callbacks supplied by the front end.
pub trait BusyIndicator: Send + Sync {
    fn show_busy(&self, message: &str);
    fn hide_busy(&self);
}

/// Indicator that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBusyIndicator;

impl BusyIndicator for NoBusyIndicator {
    fn show_busy(&self, _message: &str) {}
    fn hide_busy(&self) {}
}

struct BusyGuard<'a> {
    indicator: &'a dyn BusyIndicator,
}

impl<'a> BusyGuard<'a> {
    fn show(indicator: &'a dyn BusyIndicator, message: &str) -> Self {
        indicator.show_busy(message);
        Self { indicator }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.indicator.hide_busy();
    }
}

/// A close that did not complete.
///
/// The session is handed back, still unlocked with its unsaved entries, so the
/// caller can retry or warn that changes exist only in memory. It is `None`
/// only if the background task itself died.
#[derive(Debug, Error)]
#[error("closing the vault failed: {error}")]
pub struct CloseFailure {
    #[source]
    pub error: KeeperError,
    pub session: Option<Box<VaultSession>>,
}

fn join_error(e: tokio::task::JoinError) -> KeeperError {
    error!(error = %e, "vault background task failed");
    KeeperError::Background(e.to_string())
}

/// [`VaultSession::open`] on the blocking pool.
pub async fn open_session(
    paths: VaultPaths,
    password: SecretString,
    params: KdfParams,
    indicator: &dyn BusyIndicator,
) -> Result<VaultSession, KeeperError> {
    let _busy = BusyGuard::show(indicator, "Opening vault");
    tokio::task::spawn_blocking(move || VaultSession::open(paths, &password, params))
        .await
        .map_err(join_error)?
}

/// [`VaultSession::close`] on the blocking pool.
pub async fn close_session(
    mut session: VaultSession,
    password: SecretString,
    indicator: &dyn BusyIndicator,
) -> Result<(), CloseFailure> {
    let _busy = BusyGuard::show(indicator, "Saving vault");
    tokio::task::spawn_blocking(move || match session.close(&password) {
        Ok(()) => Ok(()),
        Err(error) => Err(CloseFailure {
            error,
            session: Some(Box::new(session)),
        }),
    })
    .await
    .map_err(|e| CloseFailure {
        error: join_error(e),
        session: None,
    })?
}
