//! AES-256-GCM file encryption for backups
//!
//! Encrypted backups are laid out as:
//!
//! ```text
//! salt (salt_length bytes) || nonce (12 bytes) || ciphertext + tag (16 bytes)
//! ```
//!
//! The key is derived from the passphrase and the salt on every call, and
//! both salt and nonce are freshly random per encryption.

use std::fs;
use std::path::Path;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use tracing::debug;

use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};
use crate::storage::file_io::{write_atomic, write_private};

use super::{KeyDerivation, Passphrase};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// File-level encryption used by the backup store
pub trait BackupCipher {
    /// Encrypt the file at `path` in place
    fn encrypt_file(&self, path: &Path, passphrase: &Passphrase) -> BackupResult<()>;

    /// Decrypt `source` and write the plaintext to `dest`
    fn decrypt_file(&self, source: &Path, dest: &Path, passphrase: &Passphrase)
        -> BackupResult<()>;
}

/// Authenticated whole-file cipher keyed by passphrase
#[derive(Debug, Clone)]
pub struct FileCipher {
    kdf: KeyDerivation,
}

impl FileCipher {
    /// Create a cipher using the given key derivation
    pub fn new(kdf: KeyDerivation) -> Self {
        Self { kdf }
    }

    /// Create a cipher from the backup configuration
    pub fn from_config(config: &BackupConfig) -> Self {
        Self::new(KeyDerivation::from_config(config))
    }

    /// Length of the header preceding the sealed bytes
    pub fn header_len(&self) -> usize {
        self.kdf.salt_length() + NONCE_SIZE
    }

    /// Encrypt `plaintext` into a self-contained blob
    pub fn seal(&self, plaintext: &[u8], passphrase: &Passphrase) -> BackupResult<Vec<u8>> {
        let (key, salt) = self.kdf.derive(passphrase, None)?;

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| BackupError::Encryption(format!("Failed to create cipher: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| BackupError::Encryption(e.to_string()))?;

        let mut blob = Vec::with_capacity(salt.len() + NONCE_SIZE + sealed.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// Decrypt a blob produced by [`FileCipher::seal`]
    ///
    /// Every failure is reported as the same `BackupError::Decryption`; the
    /// underlying cause is only logged at debug level.
    pub fn open(&self, blob: &[u8], passphrase: &Passphrase) -> BackupResult<Vec<u8>> {
        self.open_detailed(blob, passphrase).map_err(|cause| {
            debug!(%cause, "backup decryption failed");
            BackupError::Decryption
        })
    }

    fn open_detailed(&self, blob: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>, String> {
        let salt_len = self.kdf.salt_length();
        if blob.len() < self.header_len() + TAG_SIZE {
            return Err(format!("blob too short: {} bytes", blob.len()));
        }

        let (salt, rest) = blob.split_at(salt_len);
        let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);

        let (key, _) = self
            .kdf
            .derive(passphrase, Some(salt))
            .map_err(|e| e.to_string())?;

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| format!("failed to create cipher: {}", e))?;

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| "authentication failed".to_string())
    }
}

impl BackupCipher for FileCipher {
    fn encrypt_file(&self, path: &Path, passphrase: &Passphrase) -> BackupResult<()> {
        let plaintext = zeroize::Zeroizing::new(fs::read(path).map_err(|e| {
            BackupError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?);

        let blob = self.seal(&plaintext, passphrase)?;

        write_atomic(path, &blob).map_err(|e| {
            BackupError::Io(format!(
                "Failed to write encrypted {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn decrypt_file(
        &self,
        source: &Path,
        dest: &Path,
        passphrase: &Passphrase,
    ) -> BackupResult<()> {
        let blob = fs::read(source).map_err(|e| {
            debug!(path = %source.display(), error = %e, "failed to read encrypted backup");
            BackupError::Decryption
        })?;

        let plaintext = zeroize::Zeroizing::new(self.open(&blob, passphrase)?);

        write_private(dest, &plaintext).map_err(|e| {
            BackupError::Io(format!(
                "Failed to write decrypted data to {}: {}",
                dest.display(),
                e
            ))
        })
    }
}
