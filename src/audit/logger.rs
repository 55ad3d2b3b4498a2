//! Append-only admin action log
//!
//! Each entry is written as a single JSON line and flushed immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{ImsError, ImsResult};

use super::entry::{AdminAction, AuditEntry};

/// Writes admin actions to a JSONL log file
pub struct AuditLogger {
    /// Path to the log file
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append an entry to the log
    pub fn log(&self, entry: &AuditEntry) -> ImsResult<()> {
        if let Some(parent) = self.log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ImsError::Audit(format!("Failed to create log directory: {}", e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| ImsError::Audit(format!("Failed to open admin log: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| ImsError::Json(format!("Failed to serialize admin entry: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| ImsError::Audit(format!("Failed to write admin entry: {}", e)))?;

        file.flush()
            .map_err(|e| ImsError::Audit(format!("Failed to flush admin log: {}", e)))?;

        Ok(())
    }

    /// Record an action without interrupting the caller
    ///
    /// Logging failures are reported through `tracing` and otherwise ignored.
    pub fn record(&self, user: &str, action: AdminAction, details: Option<serde_json::Value>) {
        let entry = AuditEntry::new(user, action, details);
        if let Err(e) = self.log(&entry) {
            tracing::warn!(%action, error = %e, "failed to log admin action");
        }
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> ImsResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| ImsError::Audit(format!("Failed to open admin log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                ImsError::Audit(format!("Failed to read admin log line {}: {}", line_num + 1, e))
            })?;

            // Skip empty lines
            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                ImsError::Json(format!(
                    "Failed to parse admin entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent N entries, newest first
    pub fn read_recent(&self, count: usize) -> ImsResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(count);
        Ok(entries)
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
