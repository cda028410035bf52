// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value storage port used for both persistent and session state.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::SatchelError;

/// A JSON key-value store with merge-on-write semantics.
///
/// The vault holds two instances: a persistent store (survives restarts) and
/// a volatile session store (cleared when the host process ends).
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Returns the subset of `keys` that are present. Absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, SatchelError>;

    /// Writes every entry in `items`, leaving keys not named in `items` untouched.
    async fn set(&self, items: Map<String, Value>) -> Result<(), SatchelError>;

    /// Removes `keys`. Removing an absent key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), SatchelError>;
}
