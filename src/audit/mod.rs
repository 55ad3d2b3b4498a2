//! Admin action log for IMS
//!
//! Records backup, restore and prune actions in an append-only JSONL file
//! so operators can see who touched the backups and when.
//!
//! # Example
//!
//! ```rust,ignore
//! use ims::audit::{AdminAction, AuditLogger};
//! use serde_json::json;
//!
//! let logger = AuditLogger::new(paths.admin_log());
//! logger.record("admin", AdminAction::CreateBackup, Some(json!({"backup_file": name})));
//! ```

mod entry;
mod logger;

pub use entry::{AdminAction, AuditEntry};
pub use logger::AuditLogger;
