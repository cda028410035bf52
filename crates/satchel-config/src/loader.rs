// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./satchel.toml` > `~/.config/satchel/satchel.toml` >
//! `/etc/satchel/satchel.toml`, with `SATCHEL_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SatchelConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/satchel/satchel.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "satchel.toml";

/// Path of the per-user configuration file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("satchel").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/satchel/satchel.toml`
/// 3. `~/.config/satchel/satchel.toml`
/// 4. `./satchel.toml`
/// 5. `SATCHEL_*` environment variables
pub fn load_config() -> Result<SatchelConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SatchelConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SatchelConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SatchelConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SatchelConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SatchelConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `SATCHEL_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `SATCHEL_VAULT_STRICT_SWITCH_ACCOUNT` must become
/// `vault.strict_switch_account`.
fn env_provider() -> Env {
    Env::prefixed("SATCHEL_")
        // The vault password is read by the CLI, never by the config model.
        .ignore(&["vault_password"])
        .map(|key| {
            let mapped = key
                .as_str()
                .replacen("logging_", "logging.", 1)
                .replacen("storage_", "storage.", 1)
                .replacen("vault_", "vault.", 1);
            mapped.into()
        })
}
