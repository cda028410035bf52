// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change notifier that records what it was told.

use std::sync::Mutex;

use satchel_core::{ChangeNotifier, PublicAccount};

/// Records every `active_account_changed` call in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Option<PublicAccount>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far.
    pub fn calls(&self) -> Vec<Option<PublicAccount>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// The most recent notification, if any was received.
    pub fn last(&self) -> Option<Option<PublicAccount>> {
        self.calls().pop()
    }

    pub fn count(&self) -> usize {
        self.calls().len()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn active_account_changed(&self, account: Option<&PublicAccount>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(account.cloned());
        }
    }
}
