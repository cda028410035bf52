// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for Satchel vault tests.
//!
//! # Components
//!
//! - [`RecordingNotifier`] - captures every active-account change
//! - [`MockResolver`] - scripted original-address lookups
//! - [`RecordingStore`] - in-memory store that logs writes and can be made to fail

pub mod mock_notifier;
pub mod mock_resolver;
pub mod recording_store;

pub use mock_notifier::RecordingNotifier;
pub use mock_resolver::MockResolver;
pub use recording_store::{RecordingStore, StoreOp};
