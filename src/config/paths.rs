//! Path management for IMS
//!
//! Resolves the locations of the live database, the backup directory, the
//! settings file and the admin action log.
//!
//! ## Path Resolution Order
//!
//! 1. `IMS_HOME` environment variable (if set)
//! 2. `~/.ims` (home directory resolved through the `directories` crate)
//!
//! `IMS_DB_PATH` and `IMS_BACKUP_DIR` override the database file and the
//! backup directory individually.

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::ImsError;

/// Manages all paths used by IMS
#[derive(Debug, Clone)]
pub struct ImsPaths {
    /// Base directory for all IMS data
    base_dir: PathBuf,
    /// Live database file
    db_path: PathBuf,
    /// Directory holding encrypted backups
    backup_dir: PathBuf,
}

impl ImsPaths {
    /// Create a new ImsPaths instance from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and the home directory cannot
    /// be determined.
    pub fn new() -> Result<Self, ImsError> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolve paths using `lookup` for environment variables
    pub fn resolve<F>(lookup: F) -> Result<Self, ImsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = match lookup("IMS_HOME") {
            Some(custom) => PathBuf::from(custom),
            None => resolve_default_path()?,
        };

        let mut paths = Self::with_base_dir(base_dir);
        if let Some(db) = lookup("IMS_DB_PATH") {
            paths.db_path = PathBuf::from(db);
        }
        if let Some(dir) = lookup("IMS_BACKUP_DIR") {
            paths.backup_dir = PathBuf::from(dir);
        }
        Ok(paths)
    }

    /// Create ImsPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            db_path: base_dir.join("inventory.db"),
            backup_dir: base_dir.join("backups"),
            base_dir,
        }
    }

    /// Get the base directory (~/.ims/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the live database file
    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Get the backup directory (~/.ims/backups/)
    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the admin action log
    pub fn admin_log(&self) -> PathBuf {
        self.base_dir.join("admin_actions.log")
    }

    /// Ensure the base directory exists
    ///
    /// The backup directory is created by the backup store itself, which
    /// also owns its permissions.
    pub fn ensure_directories(&self) -> Result<(), ImsError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ImsError::Io(format!("Failed to create base directory: {}", e)))?;

        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, ImsError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| ImsError::Config("Could not determine home directory".into()))?;
    Ok(dirs.home_dir().join(".ims"))
}
