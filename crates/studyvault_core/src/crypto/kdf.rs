//! Key derivation for the store passphrase.
//!
//! # Responsibility
//! - Stretch the user passphrase into an AES-256 key with PBKDF2.
//! - Generate the random per-store salt.
//!
//! # Invariants
//! - Derivation is deterministic for a given passphrase and salt.
//! - The derived key is wiped from memory when dropped.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use super::{KEY_LEN, PBKDF2_ROUNDS, SALT_LEN};

/// AES-256 key derived from the passphrase.
///
/// Holds the only unwrapped copy of key material in the process; the bytes
/// are zeroized when the value is dropped.
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Derives the store key from `secret` and `salt`.
///
/// Uses PBKDF2-HMAC-SHA256 with [`PBKDF2_ROUNDS`] iterations.
pub fn derive_key(secret: &str, salt: &[u8; SALT_LEN]) -> EncryptionKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    EncryptionKey(key)
}

/// Generates a fresh random salt for a new store.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}
