// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM credential vault engine for Keeper.
//!
//! Two encrypted artifacts make up a vault:
//! - the key file, sealed under a key derived from the master password via
//!   Argon2id, holding a random entry key and entry auth key;
//! - the archive, sealed under those entry keys, holding the credential
//!   entries whose passwords are individually sealed again.
//!
//! Changing the master password rewrites only the key file.

pub mod archive;
pub mod background;
pub mod crypto;
pub mod entry;
mod fsio;
pub mod generator;
pub mod kdf;
pub mod keyfile;
pub mod password;
pub mod prompt;
pub mod secret;
pub mod session;
mod wire;

pub use background::{BusyIndicator, CloseFailure, NoBusyIndicator, close_session, open_session};
pub use crypto::Cipher;
pub use entry::{Entry, decrypt_entry_password, sort_for_display};
pub use generator::{GeneratorOptions, generate_password};
pub use kdf::KdfParams;
pub use keyfile::{EntryKeys, KeyDomain, KeyFileManager, KeyFileState, PremadeKeyCipher};
pub use password::PasswordLockedCipher;
pub use prompt::{
    get_entry_password, get_master_password, get_master_password_with_confirm,
    get_new_master_password,
};
pub use secret::SecretBuffer;
pub use session::{VaultPaths, VaultSession};
