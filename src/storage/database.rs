//! SQLite database wrapper
//!
//! The live inventory database. The backup engine only needs its file path;
//! the connection is used by the inventory tooling and by tests.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, Params, Transaction};

use crate::error::{ImsError, ImsResult};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS products (
    sku TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    price_cents INTEGER NOT NULL,
    stock_quantity INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS suppliers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    contact_person TEXT,
    email TEXT,
    phone TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_type TEXT CHECK(order_type IN ('SALE', 'PURCHASE')) NOT NULL,
    product_sku TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    price_cents INTEGER NOT NULL,
    order_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (product_sku) REFERENCES products(sku)
);
";

/// SQLite database with explicit connect/close
pub struct Database {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Database {
    /// Create a handle for the database at `path` without connecting
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    /// Create a handle and connect immediately
    pub fn open(path: impl Into<PathBuf>) -> ImsResult<Self> {
        let mut db = Self::new(path);
        db.connect()?;
        Ok(db)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a connection is open
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Connect, enable foreign keys and create the schema if missing
    pub fn connect(&mut self) -> ImsResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ImsError::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(&self.path)
            .map_err(|e| ImsError::Storage(format!("Database connection failed: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| ImsError::Storage(format!("Schema creation failed: {}", e)))?;

        self.conn = Some(conn);
        Ok(())
    }

    /// Close the connection, flushing everything to the file
    pub fn close(&mut self) -> ImsResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| ImsError::Storage(format!("Failed to close database: {}", e)))?;
        }
        Ok(())
    }

    pub(crate) fn conn(&self) -> ImsResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| ImsError::Storage("No database connection".into()))
    }

    /// Execute a single statement, returning the number of changed rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> ImsResult<usize> {
        self.conn()?
            .execute(sql, params)
            .map_err(|e| ImsError::Storage(format!("Query execution failed: {}", e)))
    }

    /// Run `f` inside a transaction, committing on success and rolling back on error
    pub fn transaction<T, F>(&mut self, f: F) -> ImsResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> ImsResult<T>,
    {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| ImsError::Storage("No database connection".into()))?;

        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| ImsError::Storage(format!("Transaction commit failed: {}", e)))?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback().map_err(|re| {
                    ImsError::Storage(format!("Transaction rollback failed: {}", re))
                })?;
                Err(e)
            }
        }
    }
}
