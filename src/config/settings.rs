//! User settings for IMS
//!
//! Manages the persisted backup settings (retention, key and salt lengths,
//! key derivation cost) and builds the explicit `BackupConfig` handed to the
//! backup engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::ImsPaths;
use crate::crypto::key_derivation::KdfParams;
use crate::error::{BackupError, BackupResult, ImsError};

/// Key length accepted by the AES-256-GCM cipher
pub const AES_256_KEY_LENGTH: usize = 32;

/// Smallest salt Argon2 accepts
pub const MIN_SALT_LENGTH: usize = 8;

/// Backup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Backups older than this many days are pruned
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Derived key length in bytes
    #[serde(default = "default_key_length")]
    pub key_length: usize,

    /// Random salt length in bytes
    #[serde(default = "default_salt_length")]
    pub salt_length: usize,

    /// Argon2id cost parameters
    #[serde(default)]
    pub kdf: KdfParams,
}

fn default_retention_days() -> u32 {
    7
}

fn default_key_length() -> usize {
    AES_256_KEY_LENGTH
}

fn default_salt_length() -> usize {
    16
}

impl BackupSettings {
    /// Check the persisted values before they reach the backup engine
    ///
    /// On top of the key and salt checks, the Argon2 cost must meet the
    /// minimum in `KdfParams::check_strength`.
    pub fn validate(&self) -> BackupResult<()> {
        check_lengths(self.key_length, self.salt_length)?;
        self.kdf.check_strength()
    }
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            key_length: default_key_length(),
            salt_length: default_salt_length(),
            kdf: KdfParams::default(),
        }
    }
}

/// User settings for IMS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backup settings
    #[serde(default)]
    pub backup: BackupSettings,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup: BackupSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    ///
    /// Environment overrides are applied on top of the file contents.
    pub fn load_or_create(paths: &ImsPaths) -> Result<Self, ImsError> {
        let settings_path = paths.settings_file();

        let mut settings = if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| ImsError::Io(format!("Failed to read settings file: {}", e)))?;

            serde_json::from_str(&contents)
                .map_err(|e| ImsError::Config(format!("Failed to parse settings file: {}", e)))?
        } else {
            // Don't save yet - let caller decide when to persist
            Settings::default()
        };

        settings.apply_env_overrides(|name| std::env::var(name).ok())?;
        settings.backup.validate()?;
        Ok(settings)
    }

    /// Apply `IMS_*` overrides using `lookup` for environment variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ImsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(days) = lookup("IMS_BACKUP_RETENTION_DAYS") {
            self.backup.retention_days = parse_override("IMS_BACKUP_RETENTION_DAYS", &days)?;
        }
        if let Some(len) = lookup("IMS_ENCRYPTION_KEY_LENGTH") {
            self.backup.key_length = parse_override("IMS_ENCRYPTION_KEY_LENGTH", &len)?;
        }
        if let Some(len) = lookup("IMS_SALT_LENGTH") {
            self.backup.salt_length = parse_override("IMS_SALT_LENGTH", &len)?;
        }
        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ImsPaths) -> Result<(), ImsError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ImsError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| ImsError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ImsError> {
    value
        .trim()
        .parse()
        .map_err(|_| ImsError::Config(format!("Invalid value for {}: '{}'", name, value)))
}

/// Everything the backup engine needs, passed explicitly to its constructor
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Live database file that gets copied
    pub db_path: PathBuf,
    /// Directory holding `backup_*.db` files
    pub backup_dir: PathBuf,
    /// Retention window in days
    pub retention_days: u32,
    /// Derived key length in bytes
    pub key_length: usize,
    /// Salt length in bytes
    pub salt_length: usize,
    /// Argon2id cost parameters
    pub kdf: KdfParams,
}

impl BackupConfig {
    /// Create a config with default backup settings
    pub fn new(db_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self::with_settings(db_path, backup_dir, &BackupSettings::default())
    }

    /// Create a config from explicit paths and settings
    pub fn with_settings(
        db_path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        settings: &BackupSettings,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            backup_dir: backup_dir.into(),
            retention_days: settings.retention_days,
            key_length: settings.key_length,
            salt_length: settings.salt_length,
            kdf: settings.kdf.clone(),
        }
    }

    /// Build the config from resolved paths and loaded settings
    pub fn from_parts(paths: &ImsPaths, settings: &Settings) -> Self {
        Self::with_settings(paths.db_path(), paths.backup_dir(), &settings.backup)
    }

    /// Override the retention window
    pub fn retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Override the key derivation cost
    pub fn kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Get the live database path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Check the values the cipher and KDF depend on
    ///
    /// The Argon2 cost set through [`BackupConfig::kdf`] is taken as given;
    /// settings loaded from disk are held to the minimum by
    /// [`BackupSettings::validate`].
    pub fn validate(&self) -> BackupResult<()> {
        check_lengths(self.key_length, self.salt_length)
    }
}

fn check_lengths(key_length: usize, salt_length: usize) -> BackupResult<()> {
    if key_length != AES_256_KEY_LENGTH {
        return Err(BackupError::Config(format!(
            "Key length must be {} bytes for AES-256-GCM, got {}",
            AES_256_KEY_LENGTH, key_length
        )));
    }
    if salt_length < MIN_SALT_LENGTH {
        return Err(BackupError::Config(format!(
            "Salt length must be at least {} bytes, got {}",
            MIN_SALT_LENGTH, salt_length
        )));
    }
    Ok(())
}
