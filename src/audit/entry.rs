//! Admin action entries
//!
//! Defines the actions that are recorded and the entry format itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Administrative actions that are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// An encrypted backup was created
    CreateBackup,
    /// The live database was restored from a backup
    RestoreBackup,
    /// Expired backups were deleted by hand
    PruneBackups,
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminAction::CreateBackup => write!(f, "create_backup"),
            AdminAction::RestoreBackup => write!(f, "restore_backup"),
            AdminAction::PruneBackups => write!(f, "prune_backups"),
        }
    }
}

/// A single admin log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the action occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Who performed the action
    pub user: String,

    /// What was done
    pub action: AdminAction,

    /// Extra context, e.g. the backup file involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Create a new entry stamped with the current time
    pub fn new(
        user: impl Into<String>,
        action: AdminAction,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user: user.into(),
            action,
            details,
        }
    }

    /// One-line summary of the details for table output
    pub fn details_summary(&self, max_len: usize) -> String {
        let text = match &self.details {
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => format!("{}={}", k, s),
                    other => format!("{}={}", k, other),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        if text.chars().count() > max_len {
            let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", truncated)
        } else {
            text
        }
    }
}
