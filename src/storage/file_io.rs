//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave half-written files behind,
//! plus owner-only permission helpers for backup material.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sibling path used while a file is being rewritten (`<name>.tmp`)
pub fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write bytes to a file atomically (write to temp, then rename)
///
/// The file is either completely replaced or not modified at all. The temp
/// file is removed if any step fails.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = temp_sibling(path);

    let result = write_synced(&temp_path, data).and_then(|_| fs::rename(&temp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let file = create_private(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(data)?;
    writer.flush()?;

    // Sync to disk before rename
    writer.get_ref().sync_all()
}

/// Write bytes to a fresh file readable only by the owner
///
/// Anything already at `path` is removed first, so a stale file never
/// keeps its permissions and a symlink is never followed.
pub fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = create_private(path)?;
    file.write_all(data)?;
    file.flush()
}

fn create_private(path: &Path) -> io::Result<File> {
    match fs::symlink_metadata(path) {
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    open_private(path)
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Copy `source` over `dest`, truncating it in place
///
/// Unlike `fs::copy` the destination keeps its own permissions. Returns the
/// number of bytes copied.
pub fn copy_into(source: &Path, dest: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.sync_all()?;
    Ok(copied)
}

/// Create a file that must not already exist
///
/// Used to reserve a filename before copying into it.
pub fn create_exclusive(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Restrict a file or directory to its owner (no-op off Unix)
#[cfg(unix)]
pub fn restrict_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Restrict a file or directory to its owner (no-op off Unix)
#[cfg(not(unix))]
pub fn restrict_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_sibling() {
        let path = Path::new("/var/backups/backup_20250101_120000.db");
        assert_eq!(
            temp_sibling(path),
            PathBuf::from("/var/backups/backup_20250101_120000.db.tmp")
        );
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");

        fs::write(&path, b"old contents").unwrap();
        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");

        write_atomic(&path, b"payload").unwrap();

        assert!(path.exists());
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn test_atomic_write_failure_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        // Renaming a file over a non-empty directory fails
        let path = temp_dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("child"), b"x").unwrap();

        assert!(write_atomic(&path, b"payload").is_err());
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn test_copy_into_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.db");
        let dest = temp_dir.path().join("dest.db");
        fs::write(&source, b"short").unwrap();
        fs::write(&dest, b"a much longer previous body").unwrap();

        let copied = copy_into(&source, &dest).unwrap();

        assert_eq!(copied, 5);
        assert_eq!(fs::read(&dest).unwrap(), b"short");
    }

    #[test]
    fn test_create_exclusive_refuses_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reserved");

        create_exclusive(&path).unwrap();
        let err = create_exclusive(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[cfg(unix)]
    #[test]
    fn test_private_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.bin");
        write_private(&path, b"plaintext").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_private_write_replaces_stale_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup_20250101_000000.db.temp");
        fs::write(&path, b"left over from a crash").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_private(&path, b"plaintext").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"plaintext");
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_private_write_does_not_follow_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let victim = temp_dir.path().join("victim.txt");
        let link = temp_dir.path().join("backup_20250101_000000.db.temp");
        fs::write(&victim, b"untouched").unwrap();
        std::os::unix::fs::symlink(&victim, &link).unwrap();

        write_private(&link, b"plaintext").unwrap();

        assert_eq!(fs::read(&victim).unwrap(), b"untouched");
        assert!(!fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&link).unwrap(), b"plaintext");
    }

    #[cfg(unix)]
    #[test]
    fn test_restrict_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("backups");
        fs::create_dir(&dir).unwrap();
        restrict_permissions(&dir, 0o700).unwrap();

        let mode = fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
