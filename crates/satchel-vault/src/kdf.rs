// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 key derivation from a password.
//!
//! The iteration count, digest and output length are fixed: existing vaults
//! can only be opened with exactly these parameters.

use std::num::NonZeroU32;

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use satchel_core::SatchelError;
use zeroize::Zeroizing;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Length of the derived secret-box key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of a freshly generated salt in bytes.
pub const SALT_LEN: usize = 16;

const ROUNDS: NonZeroU32 = match NonZeroU32::new(PBKDF2_ITERATIONS) {
    Some(rounds) => rounds,
    None => panic!("PBKDF2 iteration count must be non-zero"),
};

/// Derive a 32-byte key from `password` and `salt`.
///
/// Deterministic: the same inputs always yield the same key. The returned key
/// is wrapped in [`Zeroizing`] so it is wiped on drop.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    derive_key_with_rounds(password, salt, ROUNDS)
}

fn derive_key_with_rounds(
    password: &[u8],
    salt: &[u8],
    rounds: NonZeroU32,
) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, rounds, salt, password, key.as_mut());
    key
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], SatchelError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| SatchelError::Crypto("failed to generate random salt".to_string()))?;
    Ok(salt)
}
