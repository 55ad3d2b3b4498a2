//! IMS - inventory management with encrypted database backups
//!
//! This library provides the backup engine for the IMS inventory tool:
//! timestamped snapshots of the SQLite database, passphrase-based
//! encryption, retention pruning, and restore.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution, settings and the backup configuration
//! - `error`: Custom error types
//! - `crypto`: Key derivation and authenticated file encryption
//! - `storage`: SQLite database and file helpers
//! - `backup`: Backup creation, listing, retention and restore
//! - `audit`: Admin action log
//! - `cli`: Command handlers for the `ims` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use ims::backup::BackupStore;
//! use ims::config::{BackupConfig, ImsPaths, Settings};
//! use ims::crypto::Passphrase;
//!
//! let paths = ImsPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = BackupStore::new(BackupConfig::from_parts(&paths, &settings))?;
//! let record = store.create_backup(&Passphrase::new("correct horse battery"))?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod storage;

pub use error::{BackupError, ImsError};
