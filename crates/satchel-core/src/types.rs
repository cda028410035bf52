// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault, the storage ports and the CLI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A managed blockchain account as stored inside the encrypted vault.
///
/// Field names follow the on-disk JSON layout (`publicKey`, `privateKey`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Canonical on-chain address, `0x`-prefixed hex.
    pub address: String,
    /// Ed25519 public key, `0x`-prefixed hex.
    pub public_key: String,
    /// Ed25519 private key seed, `0x`-prefixed hex.
    pub private_key: String,
    /// Optional user-facing label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Deprecated since schema version 1; only present in legacy vaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
}

impl Account {
    /// The public part of this account, as handed to change notifications.
    pub fn public(&self) -> PublicAccount {
        PublicAccount {
            address: self.address.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("name", &self.name)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Address and public key of an account; safe to broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub address: String,
    pub public_key: String,
}

/// The decrypted account registry: address -> account, in insertion order.
///
/// Iteration order is observable ("first remaining account" selection), so
/// removals must use `shift_remove`.
pub type Accounts = IndexMap<String, Account>;

/// Lifecycle state of a vault, without any secret payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VaultStatus {
    /// No encrypted vault has been persisted.
    Uninitialized,
    /// An encrypted vault exists but no key is held in the session.
    Locked,
    /// The key and decrypted accounts are held in the session.
    Unlocked,
}
