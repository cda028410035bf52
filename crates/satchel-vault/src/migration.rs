// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forward migration of decrypted account mappings between schema versions.
//!
//! Steps run one version at a time in increasing order. Each step maps the
//! whole mapping from version `v` to `v + 1`.

use satchel_core::{Accounts, SatchelError};
use tracing::warn;

/// Schema version written by this release.
pub const LATEST_VERSION: u32 = 1;

type MigrationStep = fn(Accounts) -> Accounts;

/// `(from_version, step)` pairs; each step upgrades `from_version` by one.
const STEPS: &[(u32, MigrationStep)] = &[(0, strip_mnemonics)];

/// Upgrade `accounts` from schema version `from` to `to`.
///
/// `from == to` is the identity. Downgrades and versions without a
/// registered step fail with [`SatchelError::UnsupportedVersion`].
pub fn migrate(accounts: Accounts, from: u32, to: u32) -> Result<Accounts, SatchelError> {
    if from > to {
        return Err(SatchelError::UnsupportedVersion { from, to });
    }

    let mut accounts = accounts;
    for version in from..to {
        let step = STEPS
            .iter()
            .find(|(step_from, _)| *step_from == version)
            .map(|(_, step)| *step)
            .ok_or(SatchelError::UnsupportedVersion { from, to })?;
        accounts = step(accounts);
        warn!(from = version, to = version + 1, "migrated account vault schema");
    }
    Ok(accounts)
}

/// Version 0 -> 1: mnemonics are no longer stored.
///
/// Destructive. The removed phrases are not backed up anywhere.
pub(crate) fn strip_mnemonics(mut accounts: Accounts) -> Accounts {
    for account in accounts.values_mut() {
        account.mnemonic = None;
    }
    accounts
}
