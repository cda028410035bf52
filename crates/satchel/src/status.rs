// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `satchel status` command implementation.

use satchel_config::SatchelConfig;
use satchel_core::{SatchelError, VaultStatus};
use satchel_vault::AccountVault;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: VaultStatus,
    pub active_account: Option<String>,
    pub database_path: String,
}

pub async fn collect_status(
    vault: &AccountVault,
    config: &SatchelConfig,
) -> Result<StatusResponse, SatchelError> {
    Ok(StatusResponse {
        state: vault.state().await,
        active_account: vault.active_account_address().await?,
        database_path: config.storage.database_path.clone(),
    })
}

/// Run the `satchel status` command. Never asks for the password.
pub async fn run_status(
    vault: &AccountVault,
    config: &SatchelConfig,
    json: bool,
) -> Result<(), SatchelError> {
    let status = collect_status(vault, config).await?;

    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| SatchelError::Config(format!("failed to render status: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!("Vault:    {}", status.state);
    println!("Database: {}", status.database_path);
    match (status.state, status.active_account) {
        (VaultStatus::Uninitialized, _) => println!("Run `satchel init` to create a vault."),
        (_, Some(address)) => println!("Active:   {address}"),
        (_, None) => println!("Active:   none"),
    }
    Ok(())
}
