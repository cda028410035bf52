// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Satchel configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SatchelConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Persistent storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Account vault behavior.
    #[serde(default)]
    pub vault: VaultConfig,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing level; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Persistent storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database holding the persistent vault state.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("satchel").join("satchel.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("satchel.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Account vault configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Reject `switch_account` for addresses that are not in the registry.
    ///
    /// When `false`, the permissive legacy behavior applies: any address is
    /// accepted as the active pointer.
    #[serde(default = "default_strict_switch_account")]
    pub strict_switch_account: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            strict_switch_account: default_strict_switch_account(),
        }
    }
}

fn default_strict_switch_account() -> bool {
    true
}
