// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All access is serialized through tokio-rusqlite's single background thread.
//! Stores share one [`Database`] by cloning its connection handle.

use satchel_core::SatchelError;
use tracing::debug;

use crate::migrations;

/// Handle to the SQLite database backing the persistent stores.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, SatchelError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(SatchelError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(SatchelError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path = %path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database (tests, ephemeral sessions).
    pub async fn open_in_memory() -> Result<Self, SatchelError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(SatchelError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), SatchelError> {
        self.conn
            .call(move |conn| -> Result<Result<(), SatchelError>, rusqlite::Error> {
                if wal_mode {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")?;
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Returns the underlying connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Convert tokio-rusqlite errors into storage errors.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SatchelError {
    SatchelError::storage(format!("database error: {e}"))
}
