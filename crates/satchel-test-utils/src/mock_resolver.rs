// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted address resolver for deterministic lookup tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use satchel_core::{Account, AddressResolver, LookupError};
use tokio::sync::Mutex;

/// Outcome of one scripted lookup.
#[derive(Debug, Clone)]
enum Outcome {
    NotFound,
    Original(String),
    Fail(String),
}

/// A resolver that answers from a FIFO queue of outcomes.
///
/// When the queue is empty every lookup is `NotFound`. Each call's candidate
/// address and mnemonic are recorded.
#[derive(Debug, Default)]
pub struct MockResolver {
    outcomes: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next lookup reports no rotation record.
    pub async fn push_not_found(&self) {
        self.outcomes.lock().await.push_back(Outcome::NotFound);
    }

    /// Next lookup reports that the key was rotated away from `address`.
    pub async fn push_original(&self, address: impl Into<String>) {
        self.outcomes
            .lock()
            .await
            .push_back(Outcome::Original(address.into()));
    }

    /// Next lookup fails with a non-`NotFound` error.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.outcomes
            .lock()
            .await
            .push_back(Outcome::Fail(message.into()));
    }

    /// `(candidate address, mnemonic)` of every lookup so far.
    pub async fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl AddressResolver for MockResolver {
    async fn resolve_original_address(
        &self,
        candidate: &Account,
        mnemonic: Option<&str>,
    ) -> Result<Account, LookupError> {
        self.calls
            .lock()
            .await
            .push((candidate.address.clone(), mnemonic.map(str::to_string)));

        let outcome = self
            .outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or(Outcome::NotFound);
        match outcome {
            Outcome::NotFound => Err(LookupError::NotFound),
            Outcome::Original(address) => Ok(Account {
                address,
                ..candidate.clone()
            }),
            Outcome::Fail(message) => Err(LookupError::Other(message)),
        }
    }
}
