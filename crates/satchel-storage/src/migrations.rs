// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded SQL migrations using refinery.
//!
//! These version the SQLite table layout only; the encrypted vault payload has
//! its own schema version handled by the vault crate.

use satchel_core::SatchelError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), SatchelError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(SatchelError::storage)?;
    for migration in report.applied_migrations() {
        tracing::debug!(migration = %migration, "applied storage migration");
    }
    Ok(())
}
