// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault lifecycle: initialize, unlock, lock, clear and change password.
//!
//! The whole account mapping is sealed as one blob under a key derived from
//! the user's password. While unlocked, the decrypted mapping and the key are
//! held in memory and mirrored into the session store so an unlocked session
//! survives a restart of the vault owner. Every mutation re-seals the whole
//! mapping.
//!
//! All operations on one [`AccountVault`] are serialized through a single
//! async mutex.

use std::sync::Arc;

use satchel_config::model::VaultConfig;
use satchel_core::{
    Account, Accounts, AddressResolver, ChangeNotifier, NoopNotifier, OfflineResolver, SatchelError,
    StateStore, VaultStatus,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto;
use crate::kdf::{self, KEY_LEN};
use crate::migration::{self, LATEST_VERSION};
use crate::state::{PERSISTENT_KEYS, PersistentState, SESSION_KEYS, SessionState, StatePatch};

/// The collaborators an [`AccountVault`] talks to.
#[derive(Clone)]
pub struct VaultPorts {
    pub persistent: Arc<dyn StateStore>,
    pub session: Arc<dyn StateStore>,
    pub notifier: Arc<dyn ChangeNotifier>,
    pub resolver: Arc<dyn AddressResolver>,
}

impl VaultPorts {
    /// Ports over the given stores, with no notification sink and an offline resolver.
    pub fn new(persistent: Arc<dyn StateStore>, session: Arc<dyn StateStore>) -> Self {
        Self {
            persistent,
            session,
            notifier: Arc::new(NoopNotifier),
            resolver: Arc::new(OfflineResolver),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

/// Decrypted accounts and the key they are sealed under.
pub struct UnlockedAccounts {
    pub(crate) accounts: Accounts,
    pub(crate) key: Zeroizing<[u8; KEY_LEN]>,
    pub(crate) active_address: Option<String>,
}

impl std::fmt::Debug for UnlockedAccounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedAccounts")
            .field("accounts", &self.accounts.len())
            .field("active_address", &self.active_address)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// In-memory lifecycle state of a vault.
#[derive(Debug)]
pub enum VaultState {
    Uninitialized,
    Locked,
    Unlocked(UnlockedAccounts),
}

impl VaultState {
    pub fn status(&self) -> VaultStatus {
        match self {
            VaultState::Uninitialized => VaultStatus::Uninitialized,
            VaultState::Locked => VaultStatus::Locked,
            VaultState::Unlocked(_) => VaultStatus::Unlocked,
        }
    }

    pub(crate) fn unlocked(&self, operation: &'static str) -> Result<&UnlockedAccounts, SatchelError> {
        match self {
            VaultState::Unlocked(unlocked) => Ok(unlocked),
            other => Err(SatchelError::WrongState {
                operation,
                state: other.status(),
            }),
        }
    }

    pub(crate) fn unlocked_mut(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut UnlockedAccounts, SatchelError> {
        let state = self.status();
        match self {
            VaultState::Unlocked(unlocked) => Ok(unlocked),
            _ => Err(SatchelError::WrongState { operation, state }),
        }
    }

    fn require(&self, expected: VaultStatus, operation: &'static str) -> Result<(), SatchelError> {
        let state = self.status();
        if state == expected {
            Ok(())
        } else {
            Err(SatchelError::WrongState { operation, state })
        }
    }
}

/// The encrypted account vault.
pub struct AccountVault {
    pub(crate) persistent: Arc<dyn StateStore>,
    pub(crate) session: Arc<dyn StateStore>,
    pub(crate) notifier: Arc<dyn ChangeNotifier>,
    pub(crate) resolver: Arc<dyn AddressResolver>,
    pub(crate) config: VaultConfig,
    pub(crate) state: Mutex<VaultState>,
}

impl std::fmt::Debug for AccountVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountVault")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AccountVault {
    /// Open the vault over `ports`, deriving the initial state from the stores.
    ///
    /// No persisted ciphertext means [`VaultStatus::Uninitialized`]. A
    /// persisted vault with a complete session restores
    /// [`VaultStatus::Unlocked`], but only if the session key still opens the
    /// persisted vault; the accounts are then taken from the persisted vault.
    /// Anything else is [`VaultStatus::Locked`].
    pub async fn open(ports: VaultPorts, config: VaultConfig) -> Result<Self, SatchelError> {
        let persisted = PersistentState::load(&*ports.persistent).await?;

        let state = match &persisted.encrypted_accounts {
            None => VaultState::Uninitialized,
            Some(sealed) => {
                let session = SessionState::load(&*ports.session)
                    .await
                    .and_then(SessionState::into_unlocked);
                match session {
                    Ok(Some((cached, key))) => {
                        match restore_session(sealed, persisted.version(), &key)? {
                            Some(accounts) => {
                                if accounts != cached {
                                    debug!("session accounts were stale; using persisted vault");
                                }
                                info!(accounts = accounts.len(), "restored unlocked session");
                                VaultState::Unlocked(UnlockedAccounts {
                                    accounts,
                                    key,
                                    active_address: persisted.active_account_address.clone(),
                                })
                            }
                            None => {
                                if let Err(e) = ports.session.remove(SESSION_KEYS).await {
                                    warn!(error = %e, "failed to discard stale session");
                                }
                                VaultState::Locked
                            }
                        }
                    }
                    Ok(None) => VaultState::Locked,
                    Err(SatchelError::CorruptedVault(reason)) => {
                        warn!(%reason, "ignoring unreadable session; vault stays locked");
                        VaultState::Locked
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        debug!(state = %state.status(), "account vault opened");
        Ok(Self {
            persistent: ports.persistent,
            session: ports.session,
            notifier: ports.notifier,
            resolver: ports.resolver,
            config,
            state: Mutex::new(state),
        })
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> VaultStatus {
        self.state.lock().await.status()
    }

    /// Create a new vault holding `initial`, sealed under `password`.
    ///
    /// The first entry of `initial` becomes the active account.
    pub async fn init_accounts(
        &self,
        password: &SecretString,
        initial: Accounts,
    ) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        state.require(VaultStatus::Uninitialized, "initialize accounts")?;

        let password = password.expose_secret();
        if password.is_empty() {
            return Err(SatchelError::InvalidPassword);
        }

        let initial = migration::strip_mnemonics(initial);
        let salt = kdf::generate_salt()?;
        let key = kdf::derive_key(password.as_bytes(), &salt);
        let sealed = crypto::seal_accounts(&initial, &key)?;

        let active = initial.values().next();
        let mut patch = StatePatch::new()
            .encrypted_accounts(&sealed)?
            .salt(&salt)
            .version(LATEST_VERSION);
        if let Some(account) = active {
            patch = patch.active_account(account);
        }
        let active_address = active.map(|account| account.address.clone());
        patch.write(&*self.persistent).await?;
        *state = VaultState::Locked;

        self.write_session(&initial, &key).await?;
        info!(accounts = initial.len(), "account vault initialized");
        *state = VaultState::Unlocked(UnlockedAccounts {
            accounts: initial,
            key,
            active_address,
        });
        Ok(())
    }

    /// Decrypt the persisted vault with `password`, migrating it if needed.
    pub async fn unlock_accounts(&self, password: &SecretString) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        state.require(VaultStatus::Locked, "unlock accounts")?;

        let persisted = PersistentState::load(&*self.persistent).await?;
        let sealed = persisted
            .encrypted_accounts
            .as_ref()
            .ok_or_else(|| SatchelError::CorruptedVault("encrypted accounts are missing".into()))?;
        let key = kdf::derive_key(password.expose_secret().as_bytes(), &persisted.salt_bytes()?);
        let mut accounts = crypto::open_accounts(sealed, &key)?;

        let version = persisted.version();
        if version != LATEST_VERSION {
            accounts = migration::migrate(accounts, version, LATEST_VERSION)?;
            let resealed = crypto::seal_accounts(&accounts, &key)?;
            StatePatch::new()
                .encrypted_accounts(&resealed)?
                .version(LATEST_VERSION)
                .write(&*self.persistent)
                .await?;
        }

        self.write_session(&accounts, &key).await?;
        info!(accounts = accounts.len(), "account vault unlocked");
        *state = VaultState::Unlocked(UnlockedAccounts {
            accounts,
            key,
            active_address: persisted.active_account_address,
        });
        Ok(())
    }

    /// Drop the key and decrypted accounts from memory and the session store.
    pub async fn lock_accounts(&self) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        state.require(VaultStatus::Unlocked, "lock accounts")?;

        self.session.remove(SESSION_KEYS).await?;
        *state = VaultState::Locked;
        info!("account vault locked");
        Ok(())
    }

    /// Erase the vault: persisted state first, then the session.
    pub async fn clear_accounts(&self) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        if state.status() == VaultStatus::Uninitialized {
            return Err(SatchelError::WrongState {
                operation: "clear accounts",
                state: VaultStatus::Uninitialized,
            });
        }

        self.persistent.remove(PERSISTENT_KEYS).await?;
        *state = VaultState::Uninitialized;
        self.session.remove(SESSION_KEYS).await?;
        info!("account vault cleared");
        Ok(())
    }

    /// Re-seal the current accounts under `new_password` with a fresh salt.
    ///
    /// `old_password` is checked against the persisted vault itself, not the
    /// key cached for this session.
    pub async fn change_password(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        let unlocked = state.unlocked_mut("change password")?;

        let new_password = new_password.expose_secret();
        if new_password.is_empty() {
            return Err(SatchelError::InvalidPassword);
        }

        let persisted = PersistentState::load(&*self.persistent).await?;
        let sealed = persisted
            .encrypted_accounts
            .as_ref()
            .ok_or_else(|| SatchelError::CorruptedVault("encrypted accounts are missing".into()))?;
        let old_key = kdf::derive_key(
            old_password.expose_secret().as_bytes(),
            &persisted.salt_bytes()?,
        );
        crypto::open(sealed, &old_key)?;

        let salt = kdf::generate_salt()?;
        let new_key = kdf::derive_key(new_password.as_bytes(), &salt);
        let resealed = crypto::seal_accounts(&unlocked.accounts, &new_key)?;
        StatePatch::new()
            .encrypted_accounts(&resealed)?
            .salt(&salt)
            .write(&*self.persistent)
            .await?;
        unlocked.key = new_key;

        let cached = StatePatch::new()
            .session_key(&unlocked.key)
            .write(&*self.session)
            .await;
        if let Err(e) = cached {
            // The old key must not outlive the old salt in the session.
            if let Err(remove) = self.session.remove(SESSION_KEYS).await {
                warn!(error = %remove, "failed to drop outdated session key");
            }
            return Err(e);
        }
        info!("account vault password changed");
        Ok(())
    }

    async fn write_session(&self, accounts: &Accounts, key: &[u8; KEY_LEN]) -> Result<(), SatchelError> {
        StatePatch::new()
            .session_accounts(accounts)?
            .session_key(key)
            .write(&*self.session)
            .await
    }

    /// Seal `accounts` and persist them, then mirror them into the session.
    ///
    /// With `active`, the active pointers are written in the same persistent
    /// write and the change is announced as soon as that write lands, so the
    /// in-memory pointer never disagrees with the persisted one even when the
    /// session write fails.
    pub(crate) async fn commit(
        &self,
        unlocked: &mut UnlockedAccounts,
        accounts: Accounts,
        active: Option<&Account>,
    ) -> Result<(), SatchelError> {
        let sealed = crypto::seal_accounts(&accounts, &unlocked.key)?;
        let mut patch = StatePatch::new();
        if let Some(account) = active {
            patch = patch.active_account(account);
        }
        patch
            .encrypted_accounts(&sealed)?
            .write(&*self.persistent)
            .await?;
        unlocked.accounts = accounts;
        if let Some(account) = active {
            unlocked.active_address = Some(account.address.clone());
            self.notifier.active_account_changed(Some(&account.public()));
        }

        StatePatch::new()
            .session_accounts(&unlocked.accounts)?
            .write(&*self.session)
            .await
    }
}

/// Accounts behind a cached session key, or `None` if the key no longer
/// opens the persisted vault at the current schema version.
fn restore_session(
    sealed: &crypto::EncryptedVault,
    version: u32,
    key: &[u8; KEY_LEN],
) -> Result<Option<Accounts>, SatchelError> {
    if version != LATEST_VERSION {
        warn!(version, "session predates the persisted schema; vault stays locked");
        return Ok(None);
    }
    match crypto::open_accounts(sealed, key) {
        Ok(accounts) => Ok(Some(accounts)),
        Err(SatchelError::DecryptionFailed) => {
            warn!("session key does not open the persisted vault; vault stays locked");
            Ok(None)
        }
        Err(SatchelError::CorruptedVault(reason)) => {
            warn!(%reason, "persisted vault is unreadable; vault stays locked");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
