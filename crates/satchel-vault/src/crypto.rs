// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! XSalsa20-Poly1305 secret-box seal/open for the account mapping.
//!
//! Every call to [`seal`] generates a fresh random 192-bit nonce via the
//! system CSPRNG. Ciphertexts use the NaCl `secretbox` layout (16-byte
//! Poly1305 tag prepended), and both halves are stored as base58 text.

use crypto_secretbox::XSalsa20Poly1305;
use crypto_secretbox::aead::{Aead, KeyInit};
use ring::rand::{SecureRandom, SystemRandom};
use satchel_core::{Accounts, SatchelError};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::kdf::KEY_LEN;

/// Length of a secret-box nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Ciphertext and nonce of a sealed document, both base58-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVault {
    pub ciphertext: String,
    pub nonce: String,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn seal(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<EncryptedVault, SatchelError> {
    let cipher = cipher(key)?;

    let rng = SystemRandom::new();
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut nonce)
        .map_err(|_| SatchelError::Crypto("failed to generate random nonce".to_string()))?;

    let ciphertext = cipher
        .encrypt(nonce_ref(&nonce), plaintext)
        .map_err(|_| SatchelError::Crypto("secret-box encryption failed".to_string()))?;

    Ok(EncryptedVault {
        ciphertext: encode(&ciphertext),
        nonce: encode(&nonce),
    })
}

/// Decrypt `vault` under `key`.
///
/// Undecodable base58 or a nonce of the wrong length is
/// [`SatchelError::CorruptedVault`]; an authentication failure (wrong key or
/// tampered ciphertext) is [`SatchelError::DecryptionFailed`].
pub fn open(
    vault: &EncryptedVault,
    key: &[u8; KEY_LEN],
) -> Result<Zeroizing<Vec<u8>>, SatchelError> {
    let nonce = decode(&vault.nonce, "nonce")?;
    if nonce.len() != NONCE_LEN {
        return Err(SatchelError::CorruptedVault(format!(
            "nonce must be {NONCE_LEN} bytes, found {}",
            nonce.len()
        )));
    }
    let ciphertext = decode(&vault.ciphertext, "ciphertext")?;

    let plaintext = cipher(key)?
        .decrypt(nonce_ref(&nonce), ciphertext.as_slice())
        .map_err(|_| SatchelError::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}

/// Serialize the account mapping to JSON and seal it.
pub fn seal_accounts(
    accounts: &Accounts,
    key: &[u8; KEY_LEN],
) -> Result<EncryptedVault, SatchelError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(accounts)
            .map_err(|e| SatchelError::Crypto(format!("failed to serialize accounts: {e}")))?,
    );
    seal(&plaintext, key)
}

/// Open a sealed account mapping.
///
/// A plaintext that authenticates but is not an accounts document is
/// reported as [`SatchelError::CorruptedVault`].
pub fn open_accounts(
    vault: &EncryptedVault,
    key: &[u8; KEY_LEN],
) -> Result<Accounts, SatchelError> {
    let plaintext = open(vault, key)?;
    serde_json::from_slice(&plaintext)
        .map_err(|e| SatchelError::CorruptedVault(format!("decrypted accounts are not valid: {e}")))
}

/// Base58-encode raw bytes.
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Base58-decode `text`, naming `what` in the error.
pub fn decode(text: &str, what: &str) -> Result<Vec<u8>, SatchelError> {
    bs58::decode(text)
        .into_vec()
        .map_err(|e| SatchelError::CorruptedVault(format!("{what} is not valid base58: {e}")))
}

/// Base58-decode `text` into a fixed-size key.
pub fn decode_key(text: &str, what: &str) -> Result<Zeroizing<[u8; KEY_LEN]>, SatchelError> {
    let bytes = Zeroizing::new(decode(text, what)?);
    if bytes.len() != KEY_LEN {
        return Err(SatchelError::CorruptedVault(format!(
            "{what} must be {KEY_LEN} bytes, found {}",
            bytes.len()
        )));
    }
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// `bytes` must be exactly [`NONCE_LEN`] long.
fn nonce_ref(bytes: &[u8]) -> &crypto_secretbox::aead::Nonce<XSalsa20Poly1305> {
    crypto_secretbox::aead::Nonce::<XSalsa20Poly1305>::from_slice(bytes)
}

fn cipher(key: &[u8; KEY_LEN]) -> Result<XSalsa20Poly1305, SatchelError> {
    XSalsa20Poly1305::new_from_slice(key)
        .map_err(|_| SatchelError::Crypto("invalid secret-box key length".to_string()))
}
