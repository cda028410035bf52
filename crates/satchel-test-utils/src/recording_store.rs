// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory state store that logs writes and can simulate failures.

use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use satchel_core::{SatchelError, StateStore};
use satchel_storage::MemoryStore;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// One write observed by a [`RecordingStore`], with its keys sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Set(Vec<String>),
    Remove(Vec<String>),
}

/// A [`MemoryStore`] wrapper that records the order of writes.
///
/// With [`fail_writes`](Self::fail_writes) enabled, `set` and `remove`
/// return a storage error without touching the contents.
/// [`fail_writes_after`](Self::fail_writes_after) lets a fixed number of
/// writes through first.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    ops: Mutex<Vec<StoreOp>>,
    /// Writes still allowed before failing; `None` means unlimited.
    budget: StdMutex<Option<usize>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.set_budget(failing.then_some(0));
    }

    /// Accept the next `allowed` writes, then fail every later one.
    pub fn fail_writes_after(&self, allowed: usize) {
        self.set_budget(Some(allowed));
    }

    fn set_budget(&self, budget: Option<usize>) {
        if let Ok(mut current) = self.budget.lock() {
            *current = budget;
        }
    }

    pub async fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().await.clone()
    }

    pub async fn clear_ops(&self) {
        self.ops.lock().await.clear();
    }

    pub async fn snapshot(&self) -> Map<String, Value> {
        self.inner.snapshot().await
    }

    fn check_writable(&self) -> Result<(), SatchelError> {
        let mut budget = self
            .budget
            .lock()
            .map_err(|_| SatchelError::storage("write budget lock poisoned"))?;
        match budget.as_mut() {
            None => Ok(()),
            Some(0) => Err(SatchelError::storage("simulated write failure")),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }
}

fn sorted(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.into_iter().collect();
    keys.sort();
    keys
}

#[async_trait]
impl StateStore for RecordingStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, SatchelError> {
        self.inner.get(keys).await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), SatchelError> {
        self.check_writable()?;
        self.ops
            .lock()
            .await
            .push(StoreOp::Set(sorted(items.keys().cloned())));
        self.inner.set(items).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), SatchelError> {
        self.check_writable()?;
        self.ops
            .lock()
            .await
            .push(StoreOp::Remove(sorted(keys.iter().map(|k| k.to_string()))));
        self.inner.remove(keys).await
    }
}
