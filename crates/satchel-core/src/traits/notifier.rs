// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sink for active-account change notifications.

use crate::types::PublicAccount;

/// Receives the new active account whenever it changes.
///
/// Called on add, on removals that reassign the active account, and on
/// switch. Never called on rename, lock or unlock. `None` means no account
/// is active any more.
pub trait ChangeNotifier: Send + Sync + 'static {
    fn active_account_changed(&self, account: Option<&PublicAccount>);
}

/// A notifier that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn active_account_changed(&self, _account: Option<&PublicAccount>) {}
}
