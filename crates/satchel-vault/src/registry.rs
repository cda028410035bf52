// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account registry operations on an unlocked vault.
//!
//! Every mutation re-seals the full mapping, persists it, and mirrors it into
//! the session. Changes of the active account are announced through the
//! vault's [`ChangeNotifier`](satchel_core::ChangeNotifier).

use satchel_core::{Account, Accounts, LookupError, PublicAccount, SatchelError};
use tracing::{debug, info, warn};

use crate::account::SigningAccount;
use crate::state::{
    ACTIVE_ACCOUNT_ADDRESS, ACTIVE_ACCOUNT_PUBLIC_KEY, PersistentState, StatePatch,
};
use crate::vault::{AccountVault, UnlockedAccounts, VaultState};

impl AccountVault {
    /// A copy of the decrypted accounts, in registry order.
    pub async fn accounts(&self) -> Result<Accounts, SatchelError> {
        let state = self.state.lock().await;
        Ok(state.unlocked("read accounts")?.accounts.clone())
    }

    /// Address of the active account.
    ///
    /// The active pointer is not secret, so a locked vault answers from the
    /// persistent store.
    pub async fn active_account_address(&self) -> Result<Option<String>, SatchelError> {
        let state = self.state.lock().await;
        match &*state {
            VaultState::Unlocked(unlocked) => Ok(unlocked.active_address.clone()),
            VaultState::Locked => Ok(PersistentState::load(&*self.persistent)
                .await?
                .active_account_address),
            VaultState::Uninitialized => Ok(None),
        }
    }

    /// Address and public key of the active account.
    pub async fn active_public_account(&self) -> Result<Option<PublicAccount>, SatchelError> {
        let state = self.state.lock().await;
        let unlocked = state.unlocked("read active account")?;
        Ok(active_entry(unlocked)?.map(Account::public))
    }

    /// Signing handle for the active account.
    ///
    /// `None` when no account is active. An active address with no matching
    /// account is [`SatchelError::ActiveAccountMissing`].
    pub async fn active_account(&self) -> Result<Option<SigningAccount>, SatchelError> {
        let state = self.state.lock().await;
        let unlocked = state.unlocked("read active account")?;
        active_entry(unlocked)?
            .map(SigningAccount::from_account)
            .transpose()
    }

    /// Insert `account` (overwriting any entry at the same address in place)
    /// and make it active.
    pub async fn add_account(&self, account: Account) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        let unlocked = state.unlocked_mut("add account")?;
        self.insert_active(unlocked, account).await.map(drop)
    }

    /// Add the account behind `signing`, labelled `name`, at its original
    /// address if the key was rotated on-chain.
    ///
    /// `mnemonic` is handed to the resolver only and is never stored. Returns
    /// the account as stored.
    pub async fn look_up_and_add_account(
        &self,
        signing: &SigningAccount,
        name: Option<String>,
        mnemonic: Option<&str>,
    ) -> Result<Account, SatchelError> {
        let mut state = self.state.lock().await;
        let unlocked = state.unlocked_mut("look up and add account")?;

        let candidate = signing.to_account(name);
        let account = match self
            .resolver
            .resolve_original_address(&candidate, mnemonic)
            .await
        {
            Ok(resolved) => {
                if resolved.address != candidate.address {
                    info!(
                        derived = %candidate.address,
                        original = %resolved.address,
                        "key was rotated; adding account at its original address"
                    );
                }
                resolved
            }
            Err(LookupError::NotFound) => {
                debug!(address = %candidate.address, "no rotation record; using derived address");
                candidate
            }
            Err(e @ LookupError::Other(_)) => return Err(e.into()),
        };

        self.insert_active(unlocked, account).await
    }

    /// Replace `account` and move it to the end of the registry order.
    pub async fn update_active_account(&self, account: Account) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        let unlocked = state.unlocked_mut("update active account")?;

        let account = without_mnemonic(account);
        let mut accounts = unlocked.accounts.clone();
        accounts.shift_remove(&account.address);
        accounts.insert(account.address.clone(), account.clone());

        self.commit(unlocked, accounts, Some(&account)).await?;
        debug!(address = %account.address, "active account updated");
        Ok(())
    }

    /// Remove the account at `address`. Absent addresses are ignored.
    ///
    /// Removing the active account makes the first remaining account active
    /// (or none), and that choice is persisted before the re-sealed vault.
    pub async fn remove_account(&self, address: &str) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        let unlocked = state.unlocked_mut("remove account")?;

        if !unlocked.accounts.contains_key(address) {
            debug!(%address, "remove requested for unknown account");
            return Ok(());
        }
        let mut accounts = unlocked.accounts.clone();
        accounts.shift_remove(address);

        if unlocked.active_address.as_deref() != Some(address) {
            self.commit(unlocked, accounts, None).await?;
            debug!(%address, "account removed");
            return Ok(());
        }

        let next = accounts.values().next().cloned();
        match &next {
            Some(account) => {
                StatePatch::new()
                    .active_account(account)
                    .write(&*self.persistent)
                    .await?
            }
            None => {
                self.persistent
                    .remove(&[ACTIVE_ACCOUNT_ADDRESS, ACTIVE_ACCOUNT_PUBLIC_KEY])
                    .await?
            }
        }
        unlocked.active_address = next.as_ref().map(|account| account.address.clone());
        let public = next.as_ref().map(Account::public);
        self.notifier.active_account_changed(public.as_ref());

        self.commit(unlocked, accounts, None).await?;
        debug!(%address, next = ?unlocked.active_address, "active account removed");
        Ok(())
    }

    /// Set the label of the account at `address`. Absent addresses are ignored.
    pub async fn rename_account(
        &self,
        address: &str,
        name: impl Into<String>,
    ) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        let unlocked = state.unlocked_mut("rename account")?;

        let mut accounts = unlocked.accounts.clone();
        let Some(account) = accounts.get_mut(address) else {
            debug!(%address, "rename requested for unknown account");
            return Ok(());
        };
        account.name = Some(name.into());

        self.commit(unlocked, accounts, None).await?;
        debug!(%address, "account renamed");
        Ok(())
    }

    /// Make the account at `address` active. The sealed vault is untouched.
    ///
    /// Unknown addresses fail with [`SatchelError::AccountNotFound`] unless
    /// `strict_switch_account` is disabled, in which case the address is
    /// recorded without a public key and nobody is notified.
    pub async fn switch_account(&self, address: &str) -> Result<(), SatchelError> {
        let mut state = self.state.lock().await;
        let unlocked = state.unlocked_mut("switch account")?;

        match unlocked.accounts.get(address).cloned() {
            Some(account) => {
                StatePatch::new()
                    .active_account(&account)
                    .write(&*self.persistent)
                    .await?;
                unlocked.active_address = Some(account.address.clone());
                debug!(%address, "switched active account");
                self.notifier.active_account_changed(Some(&account.public()));
                Ok(())
            }
            None if self.config.strict_switch_account => {
                Err(SatchelError::AccountNotFound(address.to_string()))
            }
            None => {
                warn!(%address, "switching to an address that is not in the vault");
                StatePatch::new()
                    .active_address(address)
                    .write(&*self.persistent)
                    .await?;
                self.persistent.remove(&[ACTIVE_ACCOUNT_PUBLIC_KEY]).await?;
                unlocked.active_address = Some(address.to_string());
                Ok(())
            }
        }
    }

    async fn insert_active(
        &self,
        unlocked: &mut UnlockedAccounts,
        account: Account,
    ) -> Result<Account, SatchelError> {
        let account = without_mnemonic(account);
        let mut accounts = unlocked.accounts.clone();
        accounts.insert(account.address.clone(), account.clone());

        self.commit(unlocked, accounts, Some(&account)).await?;
        debug!(address = %account.address, "account added");
        Ok(account)
    }
}

/// Mnemonics are never stored from schema version 1 on.
fn without_mnemonic(mut account: Account) -> Account {
    if account.mnemonic.take().is_some() {
        warn!(address = %account.address, "discarding mnemonic; it is never stored");
    }
    account
}

fn active_entry(unlocked: &UnlockedAccounts) -> Result<Option<&Account>, SatchelError> {
    let Some(address) = unlocked.active_address.as_deref() else {
        return Ok(None);
    };
    unlocked
        .accounts
        .get(address)
        .map(Some)
        .ok_or_else(|| SatchelError::ActiveAccountMissing(address.to_string()))
}
