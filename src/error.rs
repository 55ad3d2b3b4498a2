//! Custom error types for IMS
//!
//! `BackupError` is the single error kind surfaced by the backup engine
//! (key derivation, file cipher, backup store). `ImsError` is the
//! application-level error that wraps it alongside configuration, storage
//! and audit failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the encrypted backup engine
///
/// Each variant carries enough detail for logging. The `Decryption` variant
/// is intentionally opaque: wrong passphrase, corrupted data and truncated
/// files all look the same to the caller.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The live database file to back up does not exist
    #[error("Database file not found at {}", path.display())]
    DatabaseMissing { path: PathBuf },

    /// The backup file to restore from does not exist
    #[error("Backup file not found: {}", path.display())]
    BackupNotFound { path: PathBuf },

    /// File system failure (copy, write, permissions)
    #[error("Backup I/O error: {0}")]
    Io(String),

    /// Failure while encrypting a backup
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Failure while decrypting a backup
    #[error("Decryption failed")]
    Decryption,

    /// Failure while deriving a key from a passphrase
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Invalid backup configuration
    #[error("Backup configuration error: {0}")]
    Config(String),
}

impl BackupError {
    /// Check if this is a "not found" error (missing database or backup)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DatabaseMissing { .. } | Self::BackupNotFound { .. }
        )
    }

    /// Check if this error came from the cipher layer
    pub fn is_crypto(&self) -> bool {
        matches!(
            self,
            Self::Encryption(_) | Self::Decryption | Self::KeyDerivation(_)
        )
    }
}

/// Result type alias for backup engine operations
pub type BackupResult<T> = Result<T, BackupError>;

/// The main error type for IMS operations
#[derive(Error, Debug)]
pub enum ImsError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Live database errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Admin action log errors
    #[error("Audit log error: {0}")]
    Audit(String),

    /// Validation errors for user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Backup engine errors
    #[error(transparent)]
    Backup(#[from] BackupError),
}

impl ImsError {
    /// Create a "not found" error for backups
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for products
    pub fn product_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Product",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Backup(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for ImsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ImsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rusqlite::Error> for ImsError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for IMS operations
pub type ImsResult<T> = Result<T, ImsError>;
