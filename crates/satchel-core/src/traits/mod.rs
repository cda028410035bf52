// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports to the vault's external collaborators.
//!
//! Async ports use `#[async_trait]` so they can be held as trait objects.

pub mod notifier;
pub mod resolver;
pub mod store;

pub use notifier::ChangeNotifier;
pub use resolver::AddressResolver;
pub use store::StateStore;
