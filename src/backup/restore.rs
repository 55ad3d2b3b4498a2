//! Backup restoration for IMS
//!
//! Decrypts a backup into a temporary sibling file and copies it over the
//! live database. The temporary plaintext is removed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::crypto::{BackupCipher, Passphrase};
use crate::error::{BackupError, BackupResult};
use crate::storage::file_io::copy_into;

use super::manager::BackupStore;

/// Suffix appended to a backup filename for its decrypted copy
pub const RESTORE_TEMP_SUFFIX: &str = ".temp";

/// Path of the decrypted copy used while restoring `backup_path`
pub fn restore_temp_path(backup_path: &Path) -> PathBuf {
    let mut name = backup_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(RESTORE_TEMP_SUFFIX);
    backup_path.with_file_name(name)
}

/// Deletes the file at `path` when dropped
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove decrypted temp file"
                );
            }
        }
    }
}

impl<C: BackupCipher> BackupStore<C> {
    /// Restore the live database from an encrypted backup
    ///
    /// This overwrites the live database unconditionally and takes no
    /// snapshot first. If the final copy is interrupted the live file may be
    /// partially written.
    pub fn restore_from_backup(
        &self,
        backup_path: &Path,
        passphrase: &Passphrase,
    ) -> BackupResult<()> {
        if !backup_path.exists() {
            return Err(BackupError::BackupNotFound {
                path: backup_path.to_path_buf(),
            });
        }

        let temp = TempFile::new(restore_temp_path(backup_path));

        match self.restore_via(temp.path(), backup_path, passphrase) {
            Ok(()) => {
                info!(path = %backup_path.display(), "restored database from backup");
                Ok(())
            }
            Err(e) => {
                error!(path = %backup_path.display(), error = %e, "restore failed");
                Err(e)
            }
        }
    }

    fn restore_via(
        &self,
        temp_path: &Path,
        backup_path: &Path,
        passphrase: &Passphrase,
    ) -> BackupResult<()> {
        self.cipher().decrypt_file(backup_path, temp_path, passphrase)?;

        let db_path = self.config().db_path();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                BackupError::Io(format!("Failed to create database directory: {}", e))
            })?;
        }

        copy_into(temp_path, db_path)
            .map_err(|e| BackupError::Io(format!("Failed to replace database: {}", e)))?;

        Ok(())
    }
}
