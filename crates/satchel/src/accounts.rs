// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account and vault management commands.

use std::io::{BufRead, IsTerminal, Write};
use std::sync::Arc;

use satchel_config::SatchelConfig;
use satchel_core::{Accounts, SatchelError, VaultStatus};
use satchel_storage::{Database, MemoryStore, SqliteStore};
use satchel_vault::{
    AccountVault, SigningAccount, VaultPorts, read_new_password, read_password, read_private_key,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info};

/// One row of `satchel list`. Never carries key material beyond the public key.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub address: String,
    pub public_key: String,
    pub name: Option<String>,
    pub active: bool,
}

/// Open the vault over the configured SQLite database and a fresh session.
pub async fn open_vault(config: &SatchelConfig) -> Result<AccountVault, SatchelError> {
    debug!(path = %config.storage.database_path, "opening vault database");
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let ports = VaultPorts::new(
        Arc::new(SqliteStore::persistent(db)),
        Arc::new(MemoryStore::new()),
    );
    AccountVault::open(ports, config.vault.clone()).await
}

/// Make sure the vault is unlocked, prompting for the password if needed.
async fn ensure_unlocked(vault: &AccountVault) -> Result<(), SatchelError> {
    match vault.state().await {
        VaultStatus::Unlocked => Ok(()),
        VaultStatus::Locked => {
            debug!("vault is locked; unlocking for this command");
            vault.unlock_accounts(&read_password("Vault password")?).await
        }
        state => Err(SatchelError::WrongState {
            operation: "unlock accounts",
            state,
        }),
    }
}

pub async fn run_init(vault: &AccountVault, name: Option<String>) -> Result<(), SatchelError> {
    let state = vault.state().await;
    if state != VaultStatus::Uninitialized {
        return Err(SatchelError::WrongState {
            operation: "initialize accounts",
            state,
        });
    }
    let password = read_new_password("New vault password")?;
    let account = SigningAccount::generate().to_account(name);
    let address = account.address.clone();
    let initial: Accounts = [(address.clone(), account)].into_iter().collect();
    vault.init_accounts(&password, initial).await?;
    info!(%address, "vault created");
    println!("Vault created. Active account: {address}");
    Ok(())
}

pub async fn account_summaries(vault: &AccountVault) -> Result<Vec<AccountSummary>, SatchelError> {
    let active = vault.active_account_address().await?;
    Ok(vault
        .accounts()
        .await?
        .into_values()
        .map(|account| AccountSummary {
            active: active.as_deref() == Some(account.address.as_str()),
            address: account.address,
            public_key: account.public_key,
            name: account.name,
        })
        .collect())
}

pub async fn run_list(vault: &AccountVault, json: bool) -> Result<(), SatchelError> {
    ensure_unlocked(vault).await?;
    let summaries = account_summaries(vault).await?;

    if json {
        let out = serde_json::to_string_pretty(&summaries)
            .map_err(|e| SatchelError::Config(format!("failed to render accounts: {e}")))?;
        println!("{out}");
        return Ok(());
    }
    if summaries.is_empty() {
        println!("No accounts.");
    }
    for summary in summaries {
        let marker = if summary.active { "*" } else { " " };
        println!(
            "{marker} {}  {}",
            summary.address,
            summary.name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn run_create(vault: &AccountVault, name: Option<String>) -> Result<(), SatchelError> {
    ensure_unlocked(vault).await?;
    let account = SigningAccount::generate().to_account(name);
    let address = account.address.clone();
    vault.add_account(account).await?;
    info!(%address, "account created");
    println!("Created account {address} (now active)");
    Ok(())
}

pub async fn run_import(vault: &AccountVault, name: Option<String>) -> Result<(), SatchelError> {
    let private_key = read_private_key("Private key (hex)")?;
    let signing = SigningAccount::from_private_key_hex(private_key.expose_secret())?;
    ensure_unlocked(vault).await?;
    let stored = vault.look_up_and_add_account(&signing, name, None).await?;
    info!(address = %stored.address, "account imported");
    println!("Imported account {} (now active)", stored.address);
    Ok(())
}

pub async fn run_remove(vault: &AccountVault, address: &str) -> Result<(), SatchelError> {
    ensure_unlocked(vault).await?;
    if !vault.accounts().await?.contains_key(address) {
        return Err(SatchelError::AccountNotFound(address.to_string()));
    }
    vault.remove_account(address).await?;
    info!(%address, "account removed");
    match vault.active_account_address().await? {
        Some(active) => println!("Removed {address}. Active account: {active}"),
        None => println!("Removed {address}. No accounts left."),
    }
    Ok(())
}

pub async fn run_rename(vault: &AccountVault, address: &str, name: String) -> Result<(), SatchelError> {
    ensure_unlocked(vault).await?;
    if !vault.accounts().await?.contains_key(address) {
        return Err(SatchelError::AccountNotFound(address.to_string()));
    }
    vault.rename_account(address, name).await?;
    println!("Renamed {address}");
    Ok(())
}

pub async fn run_switch(vault: &AccountVault, address: &str) -> Result<(), SatchelError> {
    ensure_unlocked(vault).await?;
    vault.switch_account(address).await?;
    info!(%address, "active account switched");
    println!("Active account: {address}");
    Ok(())
}

pub async fn run_change_password(vault: &AccountVault) -> Result<(), SatchelError> {
    let state = vault.state().await;
    if state == VaultStatus::Uninitialized {
        return Err(SatchelError::WrongState {
            operation: "change password",
            state,
        });
    }
    let old_password = read_password("Current vault password")?;
    if state == VaultStatus::Locked {
        vault.unlock_accounts(&old_password).await?;
    }
    let new_password = read_new_password("New vault password")?;
    if new_password.expose_secret() == old_password.expose_secret() {
        return Err(SatchelError::Prompt(
            "new password must differ from the current one".to_string(),
        ));
    }
    vault.change_password(&old_password, &new_password).await?;
    info!("vault password changed");
    println!("Vault password changed.");
    Ok(())
}

pub async fn run_clear(vault: &AccountVault, yes: bool) -> Result<(), SatchelError> {
    if !yes && !confirm("Delete the vault and all accounts in it? [y/N] ")? {
        println!("Aborted.");
        return Ok(());
    }
    vault.clear_accounts().await?;
    info!("vault cleared");
    println!("Vault cleared.");
    Ok(())
}

fn confirm(question: &str) -> Result<bool, SatchelError> {
    if !std::io::stdin().is_terminal() {
        return Err(SatchelError::Prompt(
            "refusing to clear without a terminal; pass --yes".to_string(),
        ));
    }
    eprint!("{question}");
    std::io::stderr()
        .flush()
        .map_err(|e| SatchelError::Prompt(e.to_string()))?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| SatchelError::Prompt(e.to_string()))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
