// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed views over the persistent and session key-value stores.

use satchel_core::{Account, Accounts, SatchelError, StateStore};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::crypto::{self, EncryptedVault};
use crate::kdf::KEY_LEN;

pub const ACTIVE_ACCOUNT_ADDRESS: &str = "activeAccountAddress";
pub const ACTIVE_ACCOUNT_PUBLIC_KEY: &str = "activeAccountPublicKey";
pub const ENCRYPTED_ACCOUNTS: &str = "encryptedAccounts";
pub const ENCRYPTED_STATE_VERSION: &str = "encryptedStateVersion";
pub const SALT: &str = "salt";

/// Every key the vault writes to the persistent store.
pub const PERSISTENT_KEYS: &[&str] = &[
    ACTIVE_ACCOUNT_ADDRESS,
    ACTIVE_ACCOUNT_PUBLIC_KEY,
    ENCRYPTED_ACCOUNTS,
    ENCRYPTED_STATE_VERSION,
    SALT,
];

pub const SESSION_ACCOUNTS: &str = "accounts";
pub const SESSION_ENCRYPTION_KEY: &str = "encryptionKey";

/// Every key the vault writes to the session store.
pub const SESSION_KEYS: &[&str] = &[SESSION_ACCOUNTS, SESSION_ENCRYPTION_KEY];

/// Vault metadata and ciphertext as read from the persistent store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentState {
    pub active_account_address: Option<String>,
    pub active_account_public_key: Option<String>,
    pub encrypted_accounts: Option<EncryptedVault>,
    pub encrypted_state_version: Option<u32>,
    pub salt: Option<String>,
}

impl PersistentState {
    pub async fn load(store: &dyn StateStore) -> Result<Self, SatchelError> {
        load(store, PERSISTENT_KEYS, "persistent vault state").await
    }

    /// Decoded salt; required once a vault exists.
    pub fn salt_bytes(&self) -> Result<Vec<u8>, SatchelError> {
        let salt = self
            .salt
            .as_deref()
            .ok_or_else(|| SatchelError::CorruptedVault("salt is missing".to_string()))?;
        crypto::decode(salt, "salt")
    }

    /// Schema version; vaults written before versioning existed count as 0.
    pub fn version(&self) -> u32 {
        self.encrypted_state_version.unwrap_or(0)
    }
}

/// Decrypted accounts and key cached in the session store while unlocked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub accounts: Option<Accounts>,
    pub encryption_key: Option<String>,
}

impl SessionState {
    pub async fn load(store: &dyn StateStore) -> Result<Self, SatchelError> {
        load(store, SESSION_KEYS, "session state").await
    }

    /// Both halves of an unlocked session, if present.
    pub fn into_unlocked(self) -> Result<Option<(Accounts, Zeroizing<[u8; KEY_LEN]>)>, SatchelError> {
        match (self.accounts, self.encryption_key) {
            (Some(accounts), Some(key)) => {
                let key = crypto::decode_key(&key, "session encryption key")?;
                Ok(Some((accounts, key)))
            }
            _ => Ok(None),
        }
    }
}

async fn load<T: DeserializeOwned>(
    store: &dyn StateStore,
    keys: &[&str],
    what: &str,
) -> Result<T, SatchelError> {
    let map = store.get(keys).await?;
    // Explicit nulls read the same as absent keys.
    let map: Map<String, Value> = map.into_iter().filter(|(_, v)| !v.is_null()).collect();
    serde_json::from_value(Value::Object(map))
        .map_err(|e| SatchelError::CorruptedVault(format!("malformed {what}: {e}")))
}

/// A batch of entries written with one merge `set`.
#[derive(Debug, Default)]
pub struct StatePatch(Map<String, Value>);

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encrypted_accounts(mut self, vault: &EncryptedVault) -> Result<Self, SatchelError> {
        let value = serde_json::to_value(vault).map_err(SatchelError::storage)?;
        self.0.insert(ENCRYPTED_ACCOUNTS.to_string(), value);
        Ok(self)
    }

    pub fn salt(mut self, salt: &[u8]) -> Self {
        self.0
            .insert(SALT.to_string(), Value::String(crypto::encode(salt)));
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.0
            .insert(ENCRYPTED_STATE_VERSION.to_string(), Value::from(version));
        self
    }

    /// Point the active pointers at `account`.
    pub fn active_account(mut self, account: &Account) -> Self {
        self.0.insert(
            ACTIVE_ACCOUNT_ADDRESS.to_string(),
            Value::String(account.address.clone()),
        );
        self.0.insert(
            ACTIVE_ACCOUNT_PUBLIC_KEY.to_string(),
            Value::String(account.public_key.clone()),
        );
        self
    }

    pub fn active_address(mut self, address: &str) -> Self {
        self.0.insert(
            ACTIVE_ACCOUNT_ADDRESS.to_string(),
            Value::String(address.to_string()),
        );
        self
    }

    pub fn session_accounts(mut self, accounts: &Accounts) -> Result<Self, SatchelError> {
        let value = serde_json::to_value(accounts).map_err(SatchelError::storage)?;
        self.0.insert(SESSION_ACCOUNTS.to_string(), value);
        Ok(self)
    }

    pub fn session_key(mut self, key: &[u8; KEY_LEN]) -> Self {
        self.0.insert(
            SESSION_ENCRYPTION_KEY.to_string(),
            Value::String(crypto::encode(key)),
        );
        self
    }

    pub async fn write(self, store: &dyn StateStore) -> Result<(), SatchelError> {
        store.set(self.0).await
    }
}
