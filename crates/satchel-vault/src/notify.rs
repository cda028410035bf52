// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of active-account changes over a broadcast channel.

use satchel_core::{ChangeNotifier, PublicAccount};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of undelivered changes kept per subscriber.
pub const DEFAULT_CAPACITY: usize = 16;

/// A [`ChangeNotifier`] that republishes every change to all subscribers.
///
/// A subscriber that falls more than `capacity` changes behind observes
/// `RecvError::Lagged` and then continues from the oldest retained change.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Option<PublicAccount>>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every change published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Option<PublicAccount>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn active_account_changed(&self, account: Option<&PublicAccount>) {
        // Sending only fails when nobody is subscribed.
        if self.sender.send(account.cloned()).is_err() {
            trace!("active account change dropped: no subscribers");
        }
    }
}
