//! Authenticated blob sealing for the store file.
//!
//! # Responsibility
//! - Encrypt snapshot bytes into the on-disk blob layout.
//! - Decrypt and authenticate blobs back into snapshot bytes.
//!
//! # Invariants
//! - Blob layout is `nonce (12 bytes) || ciphertext+tag`, nothing else.
//! - Every seal draws a fresh nonce from the OS RNG.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use super::{CryptoError, CryptoResult, EncryptionKey, NONCE_LEN};

/// Seals `plaintext` under `key`, returning the nonce-prefixed blob.
pub fn seal_blob(plaintext: &[u8], key: &EncryptionKey) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CryptoError::Cipher)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Opens a sealed blob, authenticating it under `key`.
///
/// Fails with [`CryptoError::Authentication`] when the blob is too short,
/// was sealed under a different key, or was modified in any way.
pub fn open_blob(blob: &[u8], key: &EncryptionKey) -> CryptoResult<Vec<u8>> {
    if blob.len() <= NONCE_LEN {
        return Err(CryptoError::Authentication);
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Authentication)
}
