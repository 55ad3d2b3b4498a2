//! Command-line tests for the `ims` binary.

use std::fs::{self, File};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ims(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ims").unwrap();
    cmd.env("IMS_HOME", home.path())
        .env_remove("IMS_DB_PATH")
        .env_remove("IMS_BACKUP_DIR")
        .env_remove("IMS_BACKUP_RETENTION_DAYS")
        .env_remove("IMS_ENCRYPTION_KEY_LENGTH")
        .env_remove("IMS_SALT_LENGTH")
        .env_remove("IMS_ADMIN_USER")
        .env_remove("IMS_LOG");
    cmd
}

fn backup_paths(home: &TempDir) -> Vec<PathBuf> {
    let mut paths: Vec<_> = fs::read_dir(home.path().join("backups"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    paths.sort();
    paths
}

#[test]
fn config_shows_paths() {
    let home = TempDir::new().unwrap();

    ims(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory.db"))
        .stdout(predicate::str::contains("Retention days: 7"));
}

#[test]
fn list_with_no_backups() {
    let home = TempDir::new().unwrap();

    ims(&home)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups found."));
}

#[test]
fn admin_logs_empty() {
    let home = TempDir::new().unwrap();

    ims(&home)
        .args(["admin", "logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No admin actions recorded."));
}

#[test]
fn create_without_database_fails() {
    let home = TempDir::new().unwrap();

    ims(&home)
        .args(["backup", "create"])
        .env("IMS_BACKUP_PASSPHRASE", "pw-for-tests")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database file not found"));
}

#[test]
fn create_list_restore() {
    let home = TempDir::new().unwrap();

    ims(&home).arg("init").assert().success();

    ims(&home)
        .args(["backup", "create", "--user", "alice"])
        .env("IMS_BACKUP_PASSPHRASE", "pw-for-tests")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created: backup_"));

    ims(&home)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 backup(s)"));

    ims(&home)
        .args(["backup", "restore", "latest", "--force", "--no-snapshot"])
        .env("IMS_BACKUP_PASSPHRASE", "pw-for-tests")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restore complete!"));

    let log = fs::read_to_string(home.path().join("admin_actions.log")).unwrap();
    assert!(log.contains("\"create_backup\""));
    assert!(log.contains("\"restore_backup\""));
    assert!(log.contains("\"alice\""));

    ims(&home)
        .args(["admin", "logs", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("restore_backup"));
}

#[test]
fn restore_with_wrong_passphrase_fails() {
    let home = TempDir::new().unwrap();

    ims(&home).arg("init").assert().success();
    ims(&home)
        .args(["backup", "create"])
        .env("IMS_BACKUP_PASSPHRASE", "pw-for-tests")
        .assert()
        .success();

    ims(&home)
        .args(["backup", "restore", "latest", "--force", "--no-snapshot"])
        .env("IMS_BACKUP_PASSPHRASE", "not-the-passphrase")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));
}

#[test]
fn restore_without_force_changes_nothing() {
    let home = TempDir::new().unwrap();

    ims(&home).arg("init").assert().success();
    ims(&home)
        .args(["backup", "create"])
        .env("IMS_BACKUP_PASSPHRASE", "pw-for-tests")
        .assert()
        .success();

    ims(&home)
        .args(["backup", "restore", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));

    let log = fs::read_to_string(home.path().join("admin_actions.log")).unwrap();
    assert!(!log.contains("restore_backup"));
}

#[test]
fn info_unknown_backup_fails() {
    let home = TempDir::new().unwrap();

    ims(&home)
        .args(["backup", "info", "backup_19990101_000000.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn restore_expired_backup_with_snapshot() {
    let home = TempDir::new().unwrap();

    ims(&home).arg("init").assert().success();
    ims(&home)
        .args(["backup", "create"])
        .env("IMS_BACKUP_PASSPHRASE", "pw-for-tests")
        .assert()
        .success();

    let target = backup_paths(&home).pop().unwrap();
    let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * 24 * 60 * 60);
    File::options()
        .write(true)
        .open(&target)
        .unwrap()
        .set_modified(ten_days_ago)
        .unwrap();
    let name = target.file_name().unwrap().to_string_lossy().into_owned();

    ims(&home)
        .args(["backup", "restore", &name, "--force"])
        .env("IMS_BACKUP_PASSPHRASE", "pw-for-tests")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pre-restore backup saved: backup_"))
        .stdout(predicate::str::contains("Restore complete!"));

    assert!(target.exists());
    assert_eq!(backup_paths(&home).len(), 2);

    let log = fs::read_to_string(home.path().join("admin_actions.log")).unwrap();
    assert!(log.contains("pre-restore"));
    assert!(log.contains("\"restore_backup\""));
}
