// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret acquisition from `SATCHEL_*` environment variables or a TTY prompt.

use std::io::IsTerminal;

use satchel_core::SatchelError;
use secrecy::{ExposeSecret, SecretString};

/// The environment variable name for providing the vault password.
pub const VAULT_PASSWORD_ENV_VAR: &str = "SATCHEL_VAULT_PASSWORD";

/// Replacement password for `change-password`; falls back to
/// [`VAULT_PASSWORD_ENV_VAR`] when a new vault is created.
pub const NEW_VAULT_PASSWORD_ENV_VAR: &str = "SATCHEL_NEW_VAULT_PASSWORD";

/// Hex private key for `import`, so it never appears in argv.
pub const IMPORT_PRIVATE_KEY_ENV_VAR: &str = "SATCHEL_IMPORT_PRIVATE_KEY";

/// Get the vault password from the environment or an interactive prompt.
///
/// A non-empty `SATCHEL_VAULT_PASSWORD` wins (for scripts and CI); otherwise
/// the user is prompted on the terminal with `label`.
pub fn read_password(label: &str) -> Result<SecretString, SatchelError> {
    if let Some(password) = from_env(VAULT_PASSWORD_ENV_VAR) {
        return Ok(password);
    }
    require_terminal(VAULT_PASSWORD_ENV_VAR)?;
    prompt(&format!("{label}: "))
}

/// Get a new password, asking twice on a terminal.
///
/// `SATCHEL_NEW_VAULT_PASSWORD`, then `SATCHEL_VAULT_PASSWORD`, need no
/// confirmation.
pub fn read_new_password(label: &str) -> Result<SecretString, SatchelError> {
    if let Some(password) =
        from_env(NEW_VAULT_PASSWORD_ENV_VAR).or_else(|| from_env(VAULT_PASSWORD_ENV_VAR))
    {
        return Ok(password);
    }
    require_terminal(NEW_VAULT_PASSWORD_ENV_VAR)?;
    let first = prompt(&format!("{label}: "))?;
    let second = prompt(&format!("Confirm {}: ", label.to_lowercase()))?;
    if first.expose_secret() != second.expose_secret() {
        return Err(SatchelError::Prompt("passwords do not match".to_string()));
    }
    Ok(first)
}

/// Get a private key to import without echoing it.
pub fn read_private_key(label: &str) -> Result<SecretString, SatchelError> {
    if let Some(key) = from_env(IMPORT_PRIVATE_KEY_ENV_VAR) {
        return Ok(key);
    }
    require_terminal(IMPORT_PRIVATE_KEY_ENV_VAR)?;
    prompt(&format!("{label}: "))
}

fn from_env(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn require_terminal(var: &str) -> Result<(), SatchelError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(SatchelError::Prompt(format!(
            "no input provided; set {var} or run interactively"
        )))
    }
}

fn prompt(text: &str) -> Result<SecretString, SatchelError> {
    let value = rpassword::prompt_password(text)
        .map_err(|e| SatchelError::Prompt(format!("failed to read input: {e}")))?;
    if value.is_empty() {
        return Err(SatchelError::InvalidPassword);
    }
    Ok(SecretString::from(value))
}
