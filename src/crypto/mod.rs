//! Cryptographic functions for IMS backups
//!
//! Provides AES-256-GCM file encryption with Argon2id key derivation for
//! encrypted database backups.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{BackupCipher, FileCipher, NONCE_SIZE, TAG_SIZE};
pub use key_derivation::{DerivedKey, KdfParams, KeyDerivation};
pub use secure_memory::Passphrase;
