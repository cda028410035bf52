// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Volatile in-process state store.

use async_trait::async_trait;
use satchel_core::{SatchelError, StateStore};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// A [`StateStore`] held entirely in memory.
///
/// Contents are lost when the value is dropped, which is exactly what a
/// session store needs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry, for assertions and diagnostics.
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, SatchelError> {
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), SatchelError> {
        self.entries.lock().await.extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), SatchelError> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
