//! Passphrase-based encryption primitives for the vault.
//!
//! # Responsibility
//! - Derive the store key from the passphrase and per-store salt.
//! - Seal and open store blobs with an authenticated cipher.
//!
//! # Invariants
//! - Key material never leaves this module unwrapped; `EncryptionKey`
//!   zeroizes itself on drop.
//! - A fresh random nonce is used for every seal; nonces are never reused
//!   with the same key.
//! - Decryption failure is indistinguishable between a wrong passphrase and
//!   a tampered blob.

pub mod codec;
pub mod kdf;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use codec::{open_blob, seal_blob};
pub use kdf::{derive_key, generate_salt, EncryptionKey};

/// PBKDF2-HMAC-SHA256 iteration count for key derivation.
pub const PBKDF2_ROUNDS: u32 = 100_000;
/// Length of the per-store salt in bytes.
pub const SALT_LEN: usize = 16;
/// Length of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;
/// Length of the AES-GCM nonce prepended to every sealed blob.
pub const NONCE_LEN: usize = 12;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Authentication tag did not verify: wrong passphrase or altered data.
    Authentication,
    /// The cipher rejected an encryption input.
    Cipher,
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "invalid password or corrupted data"),
            Self::Cipher => write!(f, "encryption failed"),
        }
    }
}

impl Error for CryptoError {}
