//! Admin log CLI commands

use clap::Subcommand;

use crate::audit::AuditLogger;
use crate::config::ImsPaths;
use crate::error::ImsResult;

/// Width of the details column in `admin logs`
const DETAILS_WIDTH: usize = 60;

/// Admin subcommands
#[derive(Subcommand)]
pub enum AdminCommands {
    /// Show recent admin actions (newest first)
    Logs {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

/// Handle an admin command
pub fn handle_admin_command(paths: &ImsPaths, cmd: AdminCommands) -> ImsResult<()> {
    match cmd {
        AdminCommands::Logs { count } => {
            let logger = AuditLogger::new(paths.admin_log());
            let entries = logger.read_recent(count)?;

            if entries.is_empty() {
                println!("No admin actions recorded.");
                return Ok(());
            }

            println!(
                "{:<20} {:<12} {:<16} DETAILS",
                "TIMESTAMP", "USER", "ACTION"
            );
            for entry in &entries {
                println!(
                    "{:<20} {:<12} {:<16} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.user,
                    entry.action.to_string(),
                    entry.details_summary(DETAILS_WIDTH),
                );
            }
        }
    }

    Ok(())
}
