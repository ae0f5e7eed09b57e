// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keeper credential vault.
//!
//! This crate provides the error taxonomy used throughout the Keeper
//! workspace. Cryptographic failures are classified here before they cross
//! the vault engine's boundary.

pub mod error;

pub use error::KeeperError;
