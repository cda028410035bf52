// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`StateStore`] port.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use satchel_core::{SatchelError, StateStore};
use serde_json::{Map, Value};
use tracing::debug;

use crate::database::{map_tr_err, Database};

/// Namespace used for the persistent vault state.
pub const PERSISTENT_NAMESPACE: &str = "persistent";

/// A namespaced key-value store inside the `kv_state` table.
///
/// Several stores can share one [`Database`]; each only sees rows in its own
/// namespace. Values are stored as JSON text.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
    namespace: String,
}

impl SqliteStore {
    /// Create a store over `db` scoped to `namespace`.
    pub fn new(db: Database, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }

    /// Store for the persistent vault state.
    pub fn persistent(db: Database) -> Self {
        Self::new(db, PERSISTENT_NAMESPACE)
    }

    /// The namespace this store reads and writes.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, SatchelError> {
        let namespace = self.namespace.clone();
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let rows = self
            .db
            .connection()
            .call(move |conn| -> Result<Vec<(String, String)>, rusqlite::Error> {
                let mut stmt = conn
                    .prepare_cached("SELECT value FROM kv_state WHERE namespace = ?1 AND key = ?2")?;
                let mut rows = Vec::new();
                for key in keys {
                    let value: Option<String> = stmt
                        .query_row(params![namespace, key], |row| row.get(0))
                        .optional()?;
                    if let Some(value) = value {
                        rows.push((key, value));
                    }
                }
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        rows.into_iter()
            .map(|(key, raw)| {
                let value: Value = serde_json::from_str(&raw).map_err(|e| {
                    SatchelError::storage(format!("stored value for `{key}` is not valid JSON: {e}"))
                })?;
                Ok((key, value))
            })
            .collect()
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), SatchelError> {
        let namespace = self.namespace.clone();
        let count = items.len();
        let rows: Vec<(String, String)> = items
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT INTO kv_state (namespace, key, value) VALUES (?1, ?2, ?3)
                         ON CONFLICT (namespace, key) DO UPDATE SET
                            value = excluded.value,
                            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    )?;
                    for (key, value) in &rows {
                        stmt.execute(params![namespace, key, value])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(namespace = %self.namespace, count, "state entries written");
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), SatchelError> {
        let namespace = self.namespace.clone();
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt =
                        tx.prepare_cached("DELETE FROM kv_state WHERE namespace = ?1 AND key = ?2")?;
                    for key in &keys {
                        stmt.execute(params![namespace, key])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
