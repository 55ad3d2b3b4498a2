//! Storage layer for IMS
//!
//! The live SQLite database plus file helpers (atomic writes, owner-only
//! permissions) shared with the backup engine.

pub mod database;
pub mod file_io;
pub mod products;

pub use database::Database;
pub use file_io::{copy_into, write_atomic};
pub use products::Product;
