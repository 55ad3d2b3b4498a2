//! Backup store for IMS
//!
//! Creates encrypted snapshots of the live database, lists them, and prunes
//! the ones that fall outside the retention window. The backup directory is
//! the only index: every `backup_<YYYYMMDD_HHMMSS>.db` file in it is a backup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::BackupConfig;
use crate::crypto::{BackupCipher, FileCipher, Passphrase};
use crate::error::{BackupError, BackupResult};
use crate::storage::file_io::{create_exclusive, restrict_permissions};

/// Filename prefix shared by every backup
pub const BACKUP_PREFIX: &str = "backup_";

/// Filename suffix shared by every backup
pub const BACKUP_SUFFIX: &str = ".db";

/// Timestamp embedded in backup filenames (local time, second resolution)
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Length of a formatted `TIMESTAMP_FORMAT` value
const TIMESTAMP_LEN: usize = 15;

/// Upper bound on `_n` suffixes tried for one timestamp
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Metadata about a backup, read from the file system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// When the backup was written
    pub created: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

impl BackupRecord {
    /// Read the record for a backup file
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(io::ErrorKind::Other, "not a regular file"));
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            filename,
            path: path.to_path_buf(),
            created: DateTime::<Utc>::from(metadata.modified()?),
            size_bytes: metadata.len(),
        })
    }

    /// How old the backup is at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created)
    }
}

/// Manages encrypted backup creation, listing and retention
pub struct BackupStore<C = FileCipher> {
    config: BackupConfig,
    cipher: C,
}

impl BackupStore<FileCipher> {
    /// Create a store using AES-256-GCM with the configured key derivation
    ///
    /// Creates the backup directory if needed and restricts it to the owner.
    pub fn new(config: BackupConfig) -> BackupResult<Self> {
        let cipher = FileCipher::from_config(&config);
        Self::with_cipher(config, cipher)
    }
}

impl<C: BackupCipher> BackupStore<C> {
    /// Create a store with an explicit cipher
    pub fn with_cipher(config: BackupConfig, cipher: C) -> BackupResult<Self> {
        config.validate()?;
        ensure_backup_dir(&config.backup_dir)?;
        Ok(Self { config, cipher })
    }

    /// Get the store configuration
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.config.backup_dir
    }

    pub(crate) fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Create an encrypted backup of the live database
    ///
    /// A failed backup never leaves a file behind. After a successful backup
    /// the retention sweep runs; its failures are logged, not returned.
    pub fn create_backup(&self, passphrase: &Passphrase) -> BackupResult<BackupRecord> {
        let record = self.snapshot(passphrase)?;
        self.prune_expired();
        Ok(record)
    }

    /// Create an encrypted backup without running the retention sweep
    ///
    /// Used before a restore, where the sweep could delete the backup that
    /// is about to be restored.
    pub fn snapshot(&self, passphrase: &Passphrase) -> BackupResult<BackupRecord> {
        let db_path = self.config.db_path();
        if !db_path.exists() {
            error!(path = %db_path.display(), "backup aborted: database file missing");
            return Err(BackupError::DatabaseMissing {
                path: db_path.to_path_buf(),
            });
        }

        let backup_path = self.reserve_backup_path(Local::now())?;

        let record = match self.write_backup(db_path, &backup_path, passphrase) {
            Ok(record) => record,
            Err(e) => {
                error!(path = %backup_path.display(), error = %e, "backup creation failed");
                if backup_path.exists() {
                    if let Err(rm) = fs::remove_file(&backup_path) {
                        warn!(
                            path = %backup_path.display(),
                            error = %rm,
                            "failed to remove partial backup"
                        );
                    }
                }
                return Err(e);
            }
        };

        info!(
            path = %record.path.display(),
            size = record.size_bytes,
            "created encrypted backup"
        );

        Ok(record)
    }

    /// Copy the live database to `backup_path` and encrypt it there
    fn write_backup(
        &self,
        db_path: &Path,
        backup_path: &Path,
        passphrase: &Passphrase,
    ) -> BackupResult<BackupRecord> {
        fs::copy(db_path, backup_path)
            .map_err(|e| BackupError::Io(format!("Failed to copy database: {}", e)))?;

        self.cipher.encrypt_file(backup_path, passphrase)?;

        BackupRecord::from_path(backup_path)
            .map_err(|e| BackupError::Io(format!("Failed to read backup metadata: {}", e)))
    }

    /// Pick and claim a filename for a backup taken at `now`
    ///
    /// `backup_<timestamp>.db` is used when free; otherwise `_1`, `_2`, ...
    /// are appended. The name is claimed with an exclusive create so an
    /// existing backup is never overwritten.
    fn reserve_backup_path(&self, now: DateTime<Local>) -> BackupResult<PathBuf> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = backup_filename(&timestamp, attempt);
            let path = self.config.backup_dir.join(&filename);

            match create_exclusive(&path) {
                Ok(_) => return Ok(path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(BackupError::Io(format!(
                        "Failed to create backup file {}: {}",
                        filename, e
                    )))
                }
            }
        }

        Err(BackupError::Io(format!(
            "Too many backups for timestamp {}",
            timestamp
        )))
    }

    /// List all available backups, newest first
    ///
    /// Entries whose metadata cannot be read are skipped.
    pub fn list_backups(&self) -> BackupResult<Vec<BackupRecord>> {
        let backup_dir = self.backup_dir();
        if !backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(backup_dir)
            .map_err(|e| BackupError::Io(format!("Failed to read backup directory: {}", e)))?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            let path = entry.path();
            let is_backup = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, is_backup_filename);
            if !is_backup {
                continue;
            }

            match BackupRecord::from_path(&path) {
                Ok(record) => backups.push(record),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping backup"),
            }
        }

        // Sort by date, newest first
        backups.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| b.filename.cmp(&a.filename))
        });

        Ok(backups)
    }

    /// Delete backups older than the retention window
    ///
    /// Returns the paths that were deleted.
    pub fn prune_expired(&self) -> Vec<PathBuf> {
        self.prune_expired_at(Utc::now())
    }

    /// Delete backups created strictly before `now - retention_days`
    ///
    /// A backup created exactly at the cutoff is kept. Failures on individual
    /// files are logged and skipped.
    pub fn prune_expired_at(&self, now: DateTime<Utc>) -> Vec<PathBuf> {
        let cutoff = now - Duration::days(i64::from(self.config.retention_days));

        let backups = match self.list_backups() {
            Ok(backups) => backups,
            Err(e) => {
                warn!(error = %e, "retention sweep skipped");
                return Vec::new();
            }
        };

        let mut deleted = Vec::new();
        for backup in backups.into_iter().filter(|b| b.created < cutoff) {
            match fs::remove_file(&backup.path) {
                Ok(()) => {
                    info!(filename = %backup.filename, "removed old backup");
                    deleted.push(backup.path);
                }
                Err(e) => {
                    warn!(filename = %backup.filename, error = %e, "failed to remove old backup");
                }
            }
        }

        deleted
    }

    /// Get a specific backup by filename
    pub fn get_backup(&self, filename: &str) -> BackupResult<Option<BackupRecord>> {
        if !is_backup_filename(filename) {
            return Ok(None);
        }

        let path = self.backup_dir().join(filename);
        if !path.exists() {
            return Ok(None);
        }

        BackupRecord::from_path(&path)
            .map(Some)
            .map_err(|e| BackupError::Io(format!("Failed to read backup metadata: {}", e)))
    }

    /// Get the most recent backup
    pub fn latest_backup(&self) -> BackupResult<Option<BackupRecord>> {
        let backups = self.list_backups()?;
        Ok(backups.into_iter().next())
    }
}

/// Create the backup directory if needed and restrict it to the owner
///
/// Permissions are applied on every call, not only on creation.
fn ensure_backup_dir(backup_dir: &Path) -> BackupResult<()> {
    fs::create_dir_all(backup_dir)
        .map_err(|e| BackupError::Io(format!("Failed to create backup directory: {}", e)))?;

    restrict_permissions(backup_dir, 0o700).map_err(|e| {
        BackupError::Io(format!("Failed to set backup directory permissions: {}", e))
    })
}

fn backup_filename(timestamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}{}{}", BACKUP_PREFIX, timestamp, BACKUP_SUFFIX)
    } else {
        format!("{}{}_{}{}", BACKUP_PREFIX, timestamp, attempt, BACKUP_SUFFIX)
    }
}

/// Parse the timestamp out of a backup filename
///
/// Accepts `backup_YYYYMMDD_HHMMSS.db` and `backup_YYYYMMDD_HHMMSS_<n>.db`.
pub fn parse_backup_filename(filename: &str) -> Option<NaiveDateTime> {
    let stem = filename
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_SUFFIX)?;

    let timestamp = stem.get(..TIMESTAMP_LEN)?;
    let rest = &stem[TIMESTAMP_LEN..];

    if !rest.is_empty() {
        let counter = rest.strip_prefix('_')?;
        if counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}

/// Check whether `filename` follows the backup naming convention
pub fn is_backup_filename(filename: &str) -> bool {
    parse_backup_filename(filename).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfParams;
    use chrono::{Datelike, TimeZone, Timelike};
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn create_test_store() -> (BackupStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("inventory.db");
        fs::write(&db_path, b"SQLite format 3\0 products").unwrap();

        let config = BackupConfig::new(&db_path, temp_dir.path().join("backups"))
            .kdf(KdfParams::with_values(1024, 1, 1));

        let store = BackupStore::new(config).unwrap();
        (store, temp_dir)
    }

    fn seed_backup(store: &BackupStore, filename: &str, modified: SystemTime) -> PathBuf {
        let path = store.backup_dir().join(filename);
        fs::write(&path, b"not really encrypted").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(modified).unwrap();
        path
    }

    fn days_ago(days: u64) -> SystemTime {
        SystemTime::now() - std::time::Duration::from_secs(days * 24 * 60 * 60)
    }

    #[test]
    fn test_create_backup() {
        let (store, _temp) = create_test_store();

        let record = store.create_backup(&"pw1".into()).unwrap();
        assert!(record.path.exists());
        assert!(is_backup_filename(&record.filename));
        assert_eq!(record.path.parent().unwrap(), store.backup_dir());
        assert!(record.size_bytes > 0);
    }

    #[test]
    fn test_backup_is_encrypted() {
        let (store, _temp) = create_test_store();

        let record = store.create_backup(&"pw1".into()).unwrap();
        let contents = fs::read(&record.path).unwrap();
        let original = fs::read(store.config().db_path()).unwrap();

        assert_ne!(contents, original);
        assert!(!contents.windows(8).any(|w| w == b"products"));
    }

    #[test]
    fn test_missing_database_fails_before_writing() {
        let (store, _temp) = create_test_store();
        fs::remove_file(store.config().db_path()).unwrap();

        let result = store.create_backup(&"pw1".into());
        assert!(matches!(result, Err(BackupError::DatabaseMissing { .. })));
        assert!(store.list_backups().unwrap().is_empty());
        assert_eq!(fs::read_dir(store.backup_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_same_second_backups_get_distinct_names() {
        let (store, _temp) = create_test_store();
        let now = Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();

        let first = store.reserve_backup_path(now).unwrap();
        let second = store.reserve_backup_path(now).unwrap();

        assert_eq!(first.file_name().unwrap(), "backup_20250314_092653.db");
        assert_eq!(second.file_name().unwrap(), "backup_20250314_092653_1.db");
    }

    #[test]
    fn test_list_backups_newest_first() {
        let (store, _temp) = create_test_store();
        seed_backup(&store, "backup_20250101_000000.db", days_ago(3));
        seed_backup(&store, "backup_20250102_000000.db", days_ago(1));
        seed_backup(&store, "backup_20250103_000000.db", days_ago(2));

        let backups = store.list_backups().unwrap();
        let names: Vec<_> = backups.iter().map(|b| b.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "backup_20250102_000000.db",
                "backup_20250103_000000.db",
                "backup_20250101_000000.db"
            ]
        );
    }

    #[test]
    fn test_list_backups_is_stable() {
        let (store, _temp) = create_test_store();
        store.create_backup(&"pw1".into()).unwrap();
        seed_backup(&store, "backup_20250101_000000.db", days_ago(2));

        let first = store.list_backups().unwrap();
        let second = store.list_backups().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_list_ignores_unrelated_files() {
        let (store, _temp) = create_test_store();
        fs::write(store.backup_dir().join("notes.txt"), b"hi").unwrap();
        fs::write(store.backup_dir().join("backup_latest.db"), b"hi").unwrap();
        fs::write(store.backup_dir().join("backup_20250101_000000.db.tmp"), b"hi").unwrap();
        fs::create_dir(store.backup_dir().join("backup_20250101_000001.db")).unwrap();
        seed_backup(&store, "backup_20250101_000000.db", days_ago(1));

        let backups = store.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].filename, "backup_20250101_000000.db");
    }

    #[test]
    fn test_empty_backup_dir() {
        let (store, _temp) = create_test_store();

        let backups = store.list_backups().unwrap();
        assert!(backups.is_empty());
        assert!(store.latest_backup().unwrap().is_none());
    }

    #[test]
    fn test_retention_keeps_boundary() {
        let (store, _temp) = create_test_store();
        // Whole seconds so file systems with coarse timestamps agree
        let secs = days_ago(7)
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let at_cutoff = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs);
        let just_before = at_cutoff - std::time::Duration::from_secs(1);

        let kept = seed_backup(&store, "backup_20250101_000000.db", at_cutoff);
        let dropped = seed_backup(&store, "backup_20250101_000001.db", just_before);

        let now = DateTime::<Utc>::from(at_cutoff) + Duration::days(7);
        let deleted = store.prune_expired_at(now);

        assert_eq!(deleted, vec![dropped.clone()]);
        assert!(kept.exists());
        assert!(!dropped.exists());
    }

    #[test]
    fn test_retention_ignores_unrelated_files() {
        let (store, _temp) = create_test_store();
        let unrelated = store.backup_dir().join("inventory_export.db");
        fs::write(&unrelated, b"keep me").unwrap();
        File::options()
            .write(true)
            .open(&unrelated)
            .unwrap()
            .set_modified(days_ago(30))
            .unwrap();

        let deleted = store.prune_expired();
        assert!(deleted.is_empty());
        assert!(unrelated.exists());
        assert!(store.config().db_path().exists());
    }

    #[test]
    fn test_snapshot_skips_retention() {
        let (store, _temp) = create_test_store();
        let expired = seed_backup(&store, "backup_20250101_000000.db", days_ago(10));

        let record = store.snapshot(&"pw1".into()).unwrap();
        assert!(record.path.exists());
        assert!(expired.exists());

        store.create_backup(&"pw1".into()).unwrap();
        assert!(!expired.exists());
        assert!(record.path.exists());
    }

    #[test]
    fn test_get_backup() {
        let (store, _temp) = create_test_store();
        let record = store.create_backup(&"pw1".into()).unwrap();

        let found = store.get_backup(&record.filename).unwrap().unwrap();
        assert_eq!(found.path, record.path);
        assert!(store.get_backup("backup_19990101_000000.db").unwrap().is_none());
        assert!(store.get_backup("../inventory.db").unwrap().is_none());
    }

    #[test]
    fn test_get_latest_backup() {
        let (store, _temp) = create_test_store();
        seed_backup(&store, "backup_20250101_000000.db", days_ago(2));

        let record = store.create_backup(&"pw1".into()).unwrap();

        let latest = store.latest_backup().unwrap().unwrap();
        assert_eq!(latest.path, record.path);
    }

    #[test]
    fn test_parse_backup_filename() {
        let ts = parse_backup_filename("backup_20251127_143022.db").unwrap();
        assert_eq!(ts.year(), 2025);
        assert_eq!(ts.month(), 11);
        assert_eq!(ts.day(), 27);
        assert_eq!(ts.hour(), 14);

        assert!(parse_backup_filename("backup_20251127_143022_3.db").is_some());
        assert!(parse_backup_filename("backup_20251127_143022_.db").is_none());
        assert!(parse_backup_filename("backup_20251127_143022_x.db").is_none());
        assert!(parse_backup_filename("backup_20251327_143022.db").is_none());
        assert!(parse_backup_filename("backup_20251127_143022.db.tmp").is_none());
        assert!(parse_backup_filename("backup_20251127_143022.temp").is_none());
        assert!(parse_backup_filename("inventory.db").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_dir_permissions_reapplied() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp) = create_test_store();
        let dir = store.backup_dir().to_path_buf();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        let _store = BackupStore::new(store.config().clone()).unwrap();

        let mode = fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = BackupConfig::new(
            temp_dir.path().join("inventory.db"),
            temp_dir.path().join("backups"),
        );
        config.key_length = 24;

        assert!(matches!(
            BackupStore::new(config),
            Err(BackupError::Config(_))
        ));
    }
}
