// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lookup of the original address behind a possibly-rotated signing key.

use async_trait::async_trait;

use crate::error::LookupError;
use crate::types::Account;

/// Resolves whether a key was rotated on-chain away from some original address.
///
/// Implementations make a single best-effort call with no retries.
#[async_trait]
pub trait AddressResolver: Send + Sync + 'static {
    /// Returns the account re-keyed to its original address.
    ///
    /// `candidate` carries the address derived directly from the key. Returns
    /// [`LookupError::NotFound`] when no rotation record exists.
    async fn resolve_original_address(
        &self,
        candidate: &Account,
        mnemonic: Option<&str>,
    ) -> Result<Account, LookupError>;
}

/// A resolver with no network access: every key resolves to `NotFound`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineResolver;

#[async_trait]
impl AddressResolver for OfflineResolver {
    async fn resolve_original_address(
        &self,
        _candidate: &Account,
        _mnemonic: Option<&str>,
    ) -> Result<Account, LookupError> {
        Err(LookupError::NotFound)
    }
}
