//! Key derivation using Argon2id
//!
//! Derives backup encryption keys from operator passphrases. A fresh random
//! salt is generated for every encryption; decryption re-derives the same
//! key from the salt stored in the backup header.

use std::fmt;

use argon2::{
    password_hash::rand_core::{OsRng, RngCore},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};

use super::Passphrase;

/// Smallest memory cost accepted from settings, in KiB (19 MiB)
pub const MIN_MEMORY_COST: u32 = 19456;

/// Smallest number of passes accepted from settings
pub const MIN_TIME_COST: u32 = 2;

/// Argon2id cost parameters
///
/// The defaults (64 MiB, 3 passes, 4 lanes) exceed the work factor of
/// 100,000 rounds of PBKDF2-HMAC-SHA256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (passes, default: 3)
    pub time_cost: u32,
    /// Parallelism degree (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Create params with specific values
    pub fn with_values(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Reject parameters below the Argon2id minimum (19 MiB, 2 passes)
    pub fn check_strength(&self) -> BackupResult<()> {
        if self.memory_cost < MIN_MEMORY_COST || self.time_cost < MIN_TIME_COST {
            return Err(BackupError::Config(format!(
                "Argon2 parameters too weak (memory {} KiB, {} passes); \
                 at least {} KiB and {} passes are required",
                self.memory_cost, self.time_cost, MIN_MEMORY_COST, MIN_TIME_COST
            )));
        }
        Ok(())
    }
}

/// A derived encryption key, wiped on drop
pub struct DerivedKey {
    key: Zeroizing<Vec<u8>>,
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("len", &self.key.len())
            .finish()
    }
}

/// Turns a passphrase and salt into a fixed-length key
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    params: KdfParams,
    key_length: usize,
    salt_length: usize,
}

impl KeyDerivation {
    /// Create a key derivation with explicit parameters
    pub fn new(params: KdfParams, key_length: usize, salt_length: usize) -> Self {
        Self {
            params,
            key_length,
            salt_length,
        }
    }

    /// Create a key derivation from the backup configuration
    pub fn from_config(config: &BackupConfig) -> Self {
        Self::new(config.kdf.clone(), config.key_length, config.salt_length)
    }

    /// Length of generated salts
    pub fn salt_length(&self) -> usize {
        self.salt_length
    }

    /// Length of derived keys
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Generate a random salt from the OS RNG
    pub fn generate_salt(&self) -> Vec<u8> {
        let mut salt = vec![0u8; self.salt_length];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    /// Derive a key from `passphrase`
    ///
    /// With `salt` absent a new random salt is generated. Returns the key and
    /// the salt that produced it; the same passphrase and salt always give
    /// the same key.
    pub fn derive(
        &self,
        passphrase: &Passphrase,
        salt: Option<&[u8]>,
    ) -> BackupResult<(DerivedKey, Vec<u8>)> {
        let salt = match salt {
            Some(salt) => salt.to_vec(),
            None => self.generate_salt(),
        };

        let argon2_params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(self.key_length),
        )
        .map_err(|e| BackupError::KeyDerivation(format!("Invalid Argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut key = Zeroizing::new(vec![0u8; self.key_length]);
        argon2
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|e| BackupError::KeyDerivation(e.to_string()))?;

        Ok((DerivedKey { key }, salt))
    }
}
