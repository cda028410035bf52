// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password-encrypted account vault for the Satchel wallet.
//!
//! The decrypted account mapping is sealed as a single XSalsa20-Poly1305
//! secret box under a key derived from the user's password with
//! PBKDF2-HMAC-SHA256. [`AccountVault`] drives the lifecycle
//! (initialize, unlock, lock, clear, change password) and the account
//! registry operations on top of injected persistent and session stores.

pub mod account;
pub mod crypto;
pub mod kdf;
pub mod migration;
pub mod notify;
pub mod prompt;
mod registry;
pub mod state;
pub mod vault;

pub use account::{SigningAccount, derive_address};
pub use crypto::EncryptedVault;
pub use migration::{LATEST_VERSION, migrate};
pub use notify::BroadcastNotifier;
pub use prompt::{read_new_password, read_password, read_private_key};
pub use vault::{AccountVault, VaultPorts, VaultState};
