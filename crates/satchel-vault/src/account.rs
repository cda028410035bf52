// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ed25519 signing handles for vault accounts and address derivation.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use satchel_core::{Account, SatchelError};
use sha3::{Digest, Sha3_256};
use zeroize::Zeroizing;

/// Authentication-scheme byte appended to the public key for single-signer Ed25519.
const ED25519_SCHEME: u8 = 0x00;

/// Derive the account address of a single-signer Ed25519 public key.
///
/// `0x` followed by the lowercase hex of `SHA3-256(public_key || 0x00)`.
pub fn derive_address(public_key: &[u8; 32]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Parse `0x`-prefixed (or bare) hex into exactly 32 bytes.
pub fn parse_hex_32(text: &str, what: &str) -> Result<[u8; 32], SatchelError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let bytes = Zeroizing::new(
        hex::decode(digits).map_err(|e| SatchelError::InvalidKey(format!("{what}: {e}")))?,
    );
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        SatchelError::InvalidKey(format!("{what} must be 32 bytes, found {}", bytes.len()))
    })
}

/// An account's Ed25519 key pair together with the address it lives at.
///
/// The address is derived from the key for fresh accounts, or is the
/// original address for accounts whose key was rotated on-chain.
pub struct SigningAccount {
    signing_key: SigningKey,
    address: String,
}

impl std::fmt::Debug for SigningAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningAccount")
            .field("address", &self.address)
            .field("public_key", &self.public_key_hex())
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl SigningAccount {
    /// Generate a fresh random key pair at its derived address.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Import a private key seed given as hex, at its derived address.
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, SatchelError> {
        let seed = Zeroizing::new(parse_hex_32(private_key, "private key")?);
        Ok(Self::from_signing_key(SigningKey::from_bytes(&seed)))
    }

    /// Rebuild the signing handle of a stored account.
    ///
    /// The stored address is kept as-is. Fails with
    /// [`SatchelError::InvalidKey`] if the stored public key does not belong
    /// to the stored private key.
    pub fn from_account(account: &Account) -> Result<Self, SatchelError> {
        let signing = Self::from_private_key_hex(&account.private_key)?;
        let stored_public = parse_hex_32(&account.public_key, "public key")?;
        if stored_public != signing.public_key_bytes() {
            return Err(SatchelError::InvalidKey(format!(
                "public key of account {} does not match its private key",
                account.address
            )));
        }
        Ok(signing.with_address(account.address.clone()))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = derive_address(&signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    /// Re-home this key at `address` (used for rotated keys).
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The address derived from the key alone, ignoring any rotation.
    pub fn derived_address(&self) -> String {
        derive_address(&self.public_key_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    /// `0x`-prefixed lowercase hex of the public key.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key_bytes()))
    }

    /// `0x`-prefixed lowercase hex of the private key seed.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.signing_key.to_bytes());
        Zeroizing::new(format!("0x{}", hex::encode(*seed)))
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verify a signature with strict Ed25519 rules (weak keys rejected).
    pub fn verify_strict(&self, message: &[u8], signature: &Signature) -> Result<(), SatchelError> {
        self.verifying_key()
            .verify_strict(message, signature)
            .map_err(|e| SatchelError::Crypto(format!("Ed25519 signature verification failed: {e}")))
    }

    /// The storable account record for this key.
    pub fn to_account(&self, name: Option<String>) -> Account {
        Account {
            address: self.address.clone(),
            public_key: self.public_key_hex(),
            private_key: self.private_key_hex().to_string(),
            name,
            mnemonic: None,
        }
    }
}
