use anyhow::Result;
use clap::{Parser, Subcommand};

use ims::cli::{handle_admin_command, handle_backup_command, AdminCommands, BackupCommands};
use ims::config::{ImsPaths, Settings};
use ims::storage::Database;

#[derive(Parser)]
#[command(
    name = "ims",
    version,
    about = "Inventory management with encrypted database backups",
    long_about = "IMS keeps product, supplier and order data in a local SQLite \
                  database. The backup commands take encrypted, timestamped \
                  snapshots of it, prune old ones and restore from them."
)]
struct Cli {
    /// Name recorded in the admin log for this invocation
    #[arg(long, global = true, env = "IMS_ADMIN_USER", default_value = "admin")]
    user: String,

    /// Print progress information to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypted backup management
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Admin action log
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Create the data directory, settings file and database
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    ims::logging::init(cli.verbose)?;

    let paths = ImsPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&paths, &settings, &cli.user, cmd)?;
        }
        Some(Commands::Admin(cmd)) => {
            handle_admin_command(&paths, cmd)?;
        }
        Some(Commands::Init) => {
            println!("Initializing IMS at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            let mut db = Database::open(paths.db_path())?;
            db.close()?;
            println!("Initialization complete!");
            println!("Database: {}", paths.db_path().display());
        }
        Some(Commands::Config) => {
            println!("IMS Configuration");
            println!("=================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Database:         {}", paths.db_path().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Admin log:        {}", paths.admin_log().display());
            println!();
            println!("Backup settings:");
            println!("  Retention days: {}", settings.backup.retention_days);
            println!("  Key length:     {} bytes", settings.backup.key_length);
            println!("  Salt length:    {} bytes", settings.backup.salt_length);
            println!(
                "  KDF:            Argon2id (memory {} KiB, {} passes, parallelism {})",
                settings.backup.kdf.memory_cost,
                settings.backup.kdf.time_cost,
                settings.backup.kdf.parallelism
            );
        }
        None => {
            println!("IMS - Inventory management");
            println!();
            println!("Run 'ims --help' for usage information.");
            println!("Run 'ims backup create' to take an encrypted backup.");
        }
    }

    Ok(())
}
