// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State store implementations for the Satchel account vault.
//!
//! - [`SqliteStore`]: WAL-mode SQLite with embedded migrations, all access
//!   serialized through `tokio-rusqlite`'s single background thread.
//! - [`MemoryStore`]: volatile in-process map, used as the session store and
//!   in tests.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use database::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
