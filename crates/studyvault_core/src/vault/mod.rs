//! Encrypted vault artifacts on disk.
//!
//! # Responsibility
//! - Locate and classify the two on-disk artifacts: the store blob and the
//!   key-derivation salt.
//! - Read and replace them, with replacement done atomically.
//!
//! # Invariants
//! - Store writes go through a temp file and rename; a crash mid-write
//!   leaves the previous blob intact.
//! - A store file without a salt file is a legacy plaintext store and is
//!   migrated on the next unlock.
//! - This layer never interprets snapshot bytes; it moves blobs only.

pub mod snapshot;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::crypto::{CryptoError, SALT_LEN};

pub use snapshot::{SnapshotError, StoreSnapshot, SNAPSHOT_VERSION};

/// File name of the encrypted (or legacy plaintext) store blob.
pub const STORE_FILE_NAME: &str = "studyvault.store";
/// File name of the key-derivation salt.
pub const SALT_FILE_NAME: &str = "studyvault.salt";

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug)]
pub enum VaultError {
    /// Wrong passphrase or a blob that failed authentication.
    Authentication,
    /// The artifacts could not be read or written.
    Storage(io::Error),
    /// The cipher rejected an encryption input.
    Cipher,
    /// Snapshot bytes could not be decoded or belong to a newer build.
    Snapshot(SnapshotError),
    /// The salt file exists but has the wrong length.
    MalformedSalt { expected: usize, found: usize },
}

impl Display for VaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "invalid password or corrupted data"),
            Self::Storage(err) => write!(f, "store file access failed: {err}"),
            Self::Cipher => write!(f, "encryption failed"),
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::MalformedSalt { expected, found } => write!(
                f,
                "salt file holds {found} bytes, expected exactly {expected}"
            ),
        }
    }
}

impl Error for VaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for VaultError {
    fn from(value: io::Error) -> Self {
        Self::Storage(value)
    }
}

impl From<CryptoError> for VaultError {
    fn from(value: CryptoError) -> Self {
        match value {
            CryptoError::Authentication => Self::Authentication,
            CryptoError::Cipher => Self::Cipher,
        }
    }
}

impl From<SnapshotError> for VaultError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// Classification of the on-disk artifacts before unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    /// No store file; the next unlock creates a fresh store.
    Absent,
    /// Store file without a salt: plaintext from a pre-encryption build.
    LegacyPlaintext,
    /// Store and salt both present; the normal case.
    Encrypted,
}

/// Handle to the vault directory holding both artifacts.
#[derive(Debug, Clone)]
pub struct Vault {
    dir: PathBuf,
    store_path: PathBuf,
    salt_path: PathBuf,
}

impl Vault {
    /// Points at (but does not create) a vault directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let store_path = dir.join(STORE_FILE_NAME);
        let salt_path = dir.join(SALT_FILE_NAME);
        Self {
            dir,
            store_path,
            salt_path,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn salt_path(&self) -> &Path {
        &self.salt_path
    }

    /// Classifies the artifacts currently on disk.
    pub fn status(&self) -> VaultStatus {
        if !self.store_path.exists() {
            VaultStatus::Absent
        } else if !self.salt_path.exists() {
            VaultStatus::LegacyPlaintext
        } else {
            VaultStatus::Encrypted
        }
    }

    /// Reads the raw store blob.
    pub fn read_store(&self) -> VaultResult<Vec<u8>> {
        Ok(fs::read(&self.store_path)?)
    }

    /// Atomically replaces the store blob.
    pub fn write_store(&self, bytes: &[u8]) -> VaultResult<()> {
        fs::create_dir_all(&self.dir)?;
        write_atomic(&self.store_path, bytes)?;
        Ok(())
    }

    /// Reads and length-checks the salt.
    pub fn read_salt(&self) -> VaultResult<[u8; SALT_LEN]> {
        let bytes = fs::read(&self.salt_path)?;
        let found = bytes.len();
        bytes
            .try_into()
            .map_err(|_| VaultError::MalformedSalt {
                expected: SALT_LEN,
                found,
            })
    }

    /// Atomically writes the salt.
    pub fn write_salt(&self, salt: &[u8; SALT_LEN]) -> VaultResult<()> {
        fs::create_dir_all(&self.dir)?;
        write_atomic(&self.salt_path, salt)?;
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn status_tracks_artifact_presence() {
        let dir = TempDir::new().unwrap();
        let vault = Vault::new(dir.path());
        assert_eq!(vault.status(), VaultStatus::Absent);

        vault.write_store(b"plaintext snapshot").unwrap();
        assert_eq!(vault.status(), VaultStatus::LegacyPlaintext);

        vault.write_salt(&[1u8; SALT_LEN]).unwrap();
        assert_eq!(vault.status(), VaultStatus::Encrypted);
    }

    #[test]
    fn store_write_replaces_previous_blob() {
        let dir = TempDir::new().unwrap();
        let vault = Vault::new(dir.path().join("nested"));

        vault.write_store(b"first").unwrap();
        vault.write_store(b"second").unwrap();
        assert_eq!(vault.read_store().unwrap(), b"second");

        let leftovers: Vec<_> = std::fs::read_dir(vault.dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_name().to_string_lossy().ends_with(".tmp")
            })
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn salt_round_trips_and_rejects_bad_length() {
        let dir = TempDir::new().unwrap();
        let vault = Vault::new(dir.path());

        let salt = [9u8; SALT_LEN];
        vault.write_salt(&salt).unwrap();
        assert_eq!(vault.read_salt().unwrap(), salt);

        std::fs::write(vault.salt_path(), b"short").unwrap();
        assert!(matches!(
            vault.read_salt(),
            Err(VaultError::MalformedSalt {
                expected: SALT_LEN,
                found: 5
            })
        ));
    }
}
