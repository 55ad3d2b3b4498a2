//! Encrypted backup system for IMS
//!
//! Snapshots the live database file into an owner-only backup directory,
//! encrypted under an operator passphrase, and restores it on demand.
//!
//! # Architecture
//!
//! - `BackupStore` (manager): creates, lists and prunes backups
//! - `BackupStore::restore_from_backup` (restore): decrypts a backup into a
//!   temporary sibling and copies it over the live database
//!
//! Encryption goes through the `BackupCipher` trait; `FileCipher`
//! (AES-256-GCM with Argon2id key derivation) is the default.
//!
//! # Backup Format
//!
//! Backups are named `backup_<YYYYMMDD_HHMMSS>.db` (with a `_<n>` suffix when
//! several are taken within one second) and hold
//! `salt || nonce || ciphertext`. There is no manifest; the directory listing
//! is the source of truth.
//!
//! # Retention Policy
//!
//! After every successful backup, backups created strictly before
//! `now - retention_days` (default 7) are deleted.
//!
//! # Example
//!
//! ```rust,ignore
//! use ims::backup::BackupStore;
//! use ims::config::{BackupConfig, ImsPaths, Settings};
//!
//! let paths = ImsPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = BackupStore::new(BackupConfig::from_parts(&paths, &settings))?;
//!
//! let record = store.create_backup(&"correct horse".into())?;
//!
//! // Later, restore from backup
//! store.restore_from_backup(&record.path, &"correct horse".into())?;
//! ```

mod manager;
mod restore;

pub use manager::{
    is_backup_filename, parse_backup_filename, BackupRecord, BackupStore, BACKUP_PREFIX,
    BACKUP_SUFFIX,
};
pub use restore::{restore_temp_path, RESTORE_TEMP_SUFFIX};
