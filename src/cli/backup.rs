//! Backup CLI commands
//!
//! Implements CLI commands for encrypted backup management.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{Duration, Local, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::audit::{AdminAction, AuditLogger};
use crate::backup::{BackupRecord, BackupStore};
use crate::config::{BackupConfig, ImsPaths, Settings};
use crate::crypto::Passphrase;
use crate::error::{ImsError, ImsResult};

use super::{format_duration, format_size};

/// Environment variable that supplies the passphrase non-interactively
pub const PASSPHRASE_ENV: &str = "IMS_BACKUP_PASSPHRASE";

/// Minimum passphrase length accepted for new backups
const MIN_PASSPHRASE_LEN: usize = 8;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new encrypted backup
    Create,

    /// List all available backups
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Restore the database from a backup
    Restore {
        /// Backup filename or path (use 'latest' for most recent; omit to choose)
        backup: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,

        /// Don't snapshot the current database before restoring
        #[arg(long)]
        no_snapshot: bool,
    },

    /// Show information about a specific backup
    Info {
        /// Backup filename or path
        backup: String,
    },

    /// Delete backups older than the retention period
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &ImsPaths,
    settings: &Settings,
    user: &str,
    cmd: BackupCommands,
) -> ImsResult<()> {
    let store = BackupStore::new(BackupConfig::from_parts(paths, settings))?;
    let audit = AuditLogger::new(paths.admin_log());

    match cmd {
        BackupCommands::Create => {
            println!("Create Encrypted Backup");
            println!("=======================");
            let passphrase = obtain_new_passphrase()?;

            println!("Creating backup...");
            let record = store.create_backup(&passphrase)?;
            println!("Backup created: {}", record.filename);
            println!("Location: {}", record.path.display());
            println!("Size: {}", format_size(record.size_bytes));

            audit.record(
                user,
                AdminAction::CreateBackup,
                Some(json!({"backup_file": record.path.display().to_string()})),
            );
        }

        BackupCommands::List { verbose } => {
            let backups = store.list_backups()?;

            if backups.is_empty() {
                println!("No backups found.");
                println!("Create one with: ims backup create");
                return Ok(());
            }

            println!("Available Backups");
            println!("=================");
            println!();

            let now = Utc::now();
            for (i, backup) in backups.iter().enumerate() {
                let age_str = format_duration(backup.age(now));

                if verbose {
                    println!(
                        "{}. {}\n   Created: {}\n   Size: {}\n   Age: {}\n   Path: {}\n",
                        i + 1,
                        backup.filename,
                        backup.created.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                        format_size(backup.size_bytes),
                        age_str,
                        backup.path.display(),
                    );
                } else {
                    println!(
                        "  {}. {} ({} ago, {})",
                        i + 1,
                        backup.filename,
                        age_str,
                        format_size(backup.size_bytes),
                    );
                }
            }

            println!();
            println!("Total: {} backup(s)", backups.len());
        }

        BackupCommands::Restore {
            backup,
            force,
            no_snapshot,
        } => {
            let backup_path = match backup {
                Some(identifier) => resolve_backup_path(&store, &identifier)?,
                None => match choose_backup(&store)? {
                    Some(path) => path,
                    None => return Ok(()),
                },
            };

            let record = BackupRecord::from_path(&backup_path)
                .map_err(|e| ImsError::Io(format!("Failed to read backup: {}", e)))?;
            print_backup_details(&record);
            println!();

            if !force {
                println!("WARNING: This will overwrite the current database!");
                println!("To proceed, run again with --force flag:");
                println!("  ims backup restore {} --force", record.filename);
                return Ok(());
            }

            if !no_snapshot && store.config().db_path().exists() {
                println!("Creating backup of current database before restore...");
                let snapshot_pass = obtain_new_passphrase()?;
                let snapshot = store.snapshot(&snapshot_pass)?;
                println!("Pre-restore backup saved: {}", snapshot.filename);
                audit.record(
                    user,
                    AdminAction::CreateBackup,
                    Some(json!({
                        "backup_file": snapshot.path.display().to_string(),
                        "reason": "pre-restore",
                    })),
                );
                println!();
            }

            let passphrase = obtain_passphrase("Enter backup passphrase: ")?;

            println!("Restoring from backup...");
            store.restore_from_backup(&backup_path, &passphrase)?;
            println!("Restore complete!");

            audit.record(
                user,
                AdminAction::RestoreBackup,
                Some(json!({"backup_file": record.filename})),
            );
        }

        BackupCommands::Info { backup } => {
            let backup_path = resolve_backup_path(&store, &backup)?;
            let record = BackupRecord::from_path(&backup_path)
                .map_err(|e| ImsError::Io(format!("Failed to read backup: {}", e)))?;

            print_backup_details(&record);
        }

        BackupCommands::Prune { force } => {
            let retention_days = store.config().retention_days;
            let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
            let backups = store.list_backups()?;
            let expired: Vec<_> = backups.iter().filter(|b| b.created < cutoff).collect();

            if expired.is_empty() {
                println!("No backups to prune.");
                println!(
                    "Retention period: {} day(s). You have {} backup(s).",
                    retention_days,
                    backups.len()
                );
                return Ok(());
            }

            println!("Prune Summary");
            println!("=============");
            println!("Retention period: {} day(s)", retention_days);
            println!("Current backups: {}", backups.len());
            println!("To be deleted: {}", expired.len());
            for backup in &expired {
                println!("  - {}", backup.filename);
            }
            println!();

            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  ims backup prune --force");
                return Ok(());
            }

            let deleted = store.prune_expired();
            println!("Deleted {} backup(s).", deleted.len());

            audit.record(
                user,
                AdminAction::PruneBackups,
                Some(json!({"deleted": deleted.len()})),
            );
        }
    }

    Ok(())
}

fn print_backup_details(record: &BackupRecord) {
    println!("Backup Details");
    println!("==============");
    println!("File: {}", record.path.display());
    println!("Size: {}", format_size(record.size_bytes));
    println!(
        "Created: {}",
        record.created.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    println!("Age: {}", format_duration(record.age(Utc::now())));
}

/// Resolve a backup identifier to a full path
fn resolve_backup_path(store: &BackupStore, backup: &str) -> ImsResult<PathBuf> {
    // Handle "latest" keyword
    if backup.eq_ignore_ascii_case("latest") {
        return store
            .latest_backup()?
            .map(|b| b.path)
            .ok_or_else(|| ImsError::backup_not_found("latest"));
    }

    // Check if it's a filename in the backup directory
    if let Some(record) = store.get_backup(backup)? {
        return Ok(record.path);
    }

    // Check if it's a full path
    let path = PathBuf::from(backup);
    if path.is_file() {
        return Ok(path);
    }

    Err(ImsError::backup_not_found(backup))
}

/// List backups and let the operator pick one by number
fn choose_backup(store: &BackupStore) -> ImsResult<Option<PathBuf>> {
    let backups = store.list_backups()?;
    if backups.is_empty() {
        println!("No backups available.");
        return Ok(None);
    }

    println!("Available backups:");
    for (i, backup) in backups.iter().enumerate() {
        println!(
            "  {}. {} ({})",
            i + 1,
            backup.filename,
            backup.created.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
    }

    print!("\nSelect backup to restore (number): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let choice: usize = input
        .trim()
        .parse()
        .map_err(|_| ImsError::Validation(format!("Invalid selection: '{}'", input.trim())))?;

    backups
        .into_iter()
        .nth(choice.wrapping_sub(1))
        .map(|b| Some(b.path))
        .ok_or_else(|| ImsError::Validation(format!("No backup numbered {}", choice)))
}

/// Prompt for a new passphrase with confirmation
///
/// `IMS_BACKUP_PASSPHRASE` takes precedence for non-interactive use.
fn obtain_new_passphrase() -> ImsResult<Passphrase> {
    if let Some(passphrase) = passphrase_from_env() {
        return Ok(passphrase);
    }

    loop {
        let pass1 = prompt_passphrase("Enter encryption passphrase: ")?;

        if pass1.len() < MIN_PASSPHRASE_LEN {
            println!(
                "Passphrase must be at least {} characters. Please try again.",
                MIN_PASSPHRASE_LEN
            );
            continue;
        }

        let pass2 = prompt_passphrase("Confirm passphrase: ")?;

        if pass1 != pass2 {
            println!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(pass1);
    }
}

/// Prompt for an existing passphrase
fn obtain_passphrase(prompt: &str) -> ImsResult<Passphrase> {
    match passphrase_from_env() {
        Some(passphrase) => Ok(passphrase),
        None => prompt_passphrase(prompt),
    }
}

fn passphrase_from_env() -> Option<Passphrase> {
    std::env::var(PASSPHRASE_ENV).ok().map(Passphrase::from)
}

/// Prompt for a passphrase (hidden input)
fn prompt_passphrase(prompt: &str) -> ImsResult<Passphrase> {
    rpassword::prompt_password(prompt)
        .map(Passphrase::from)
        .map_err(|e| ImsError::Io(format!("Failed to read passphrase: {}", e)))
}
