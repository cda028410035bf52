// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Satchel account vault.

use thiserror::Error;

use crate::types::VaultStatus;

/// The primary error type used across the vault, the storage ports and the CLI.
#[derive(Debug, Error)]
pub enum SatchelError {
    /// The supplied password is not acceptable (empty).
    #[error("invalid password: password must not be empty")]
    InvalidPassword,

    /// Authenticated decryption failed: wrong password or tampered ciphertext.
    #[error("incorrect password or tampered vault -- decryption failed")]
    DecryptionFailed,

    /// Persisted vault data could not be decoded (bad encoding, bad lengths, bad JSON).
    #[error("corrupted vault: {0}")]
    CorruptedVault(String),

    /// No migration path exists between the two schema versions.
    #[error("unsupported vault schema migration from version {from} to version {to}")]
    UnsupportedVersion { from: u32, to: u32 },

    /// The operation is not valid in the vault's current lifecycle state.
    #[error("cannot {operation} while vault is {state}")]
    WrongState {
        operation: &'static str,
        state: VaultStatus,
    },

    /// The requested account address is not part of the unlocked registry.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The persisted active account pointer does not refer to a known account.
    #[error("active account {0} is not present in the unlocked accounts")]
    ActiveAccountMissing(String),

    /// Key material could not be parsed.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// The original-address lookup failed with something other than "not found".
    #[error("address lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Random number generation or primitive setup failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// The password could not be obtained from the environment or a terminal.
    #[error("password prompt failed: {0}")]
    Prompt(String),
}

impl SatchelError {
    /// Wrap any error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        SatchelError::Storage {
            source: source.into(),
        }
    }
}

/// Outcome of a failed original-address lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No rotation record exists for the key. This is the normal path for
    /// freshly created accounts.
    #[error("no rotation record found for the given key")]
    NotFound,

    /// Any other failure (network, decoding, node error).
    #[error("{0}")]
    Other(String),
}
