//! Configuration module for IMS
//!
//! This module provides configuration management including:
//! - Path resolution with environment overrides
//! - User settings persistence
//! - The explicit configuration object consumed by the backup engine

pub mod paths;
pub mod settings;

pub use paths::ImsPaths;
pub use settings::{BackupConfig, BackupSettings, Settings};
