// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Satchel account vault.
//!
//! This crate provides the account data model, the error taxonomy, and the
//! ports (storage, change notification, original-address lookup) through
//! which the vault talks to the outside world.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{LookupError, SatchelError};
pub use types::{Account, Accounts, PublicAccount, VaultStatus};

pub use traits::notifier::NoopNotifier;
pub use traits::resolver::OfflineResolver;
pub use traits::{AddressResolver, ChangeNotifier, StateStore};
