//! Product rows in the live database

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{ImsError, ImsResult};

use super::Database;

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    /// Unit price in cents
    pub price_cents: i64,
    pub stock_quantity: i64,
}

impl Product {
    /// Create a product with no description
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
        stock: i64,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            description: None,
            price_cents,
            stock_quantity: stock,
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            sku: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price_cents: row.get(3)?,
            stock_quantity: row.get(4)?,
        })
    }

    fn validate(&self) -> ImsResult<()> {
        if self.sku.trim().is_empty() {
            return Err(ImsError::Validation("SKU cannot be empty".into()));
        }
        if self.price_cents < 0 {
            return Err(ImsError::Validation("Price cannot be negative".into()));
        }
        if self.stock_quantity < 0 {
            return Err(ImsError::Validation("Stock cannot be negative".into()));
        }
        Ok(())
    }
}

impl Database {
    /// Insert a product or replace the existing row with the same SKU
    pub fn upsert_product(&self, product: &Product) -> ImsResult<()> {
        product.validate()?;
        self.execute(
            "INSERT INTO products (sku, name, description, price_cents, stock_quantity)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(sku) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                price_cents = excluded.price_cents,
                stock_quantity = excluded.stock_quantity",
            params![
                product.sku,
                product.name,
                product.description,
                product.price_cents,
                product.stock_quantity
            ],
        )?;
        Ok(())
    }

    /// Look up a product by SKU
    pub fn get_product(&self, sku: &str) -> ImsResult<Option<Product>> {
        let product = self
            .conn()?
            .query_row(
                "SELECT sku, name, description, price_cents, stock_quantity
                 FROM products WHERE sku = ?1",
                [sku],
                Product::from_row,
            )
            .optional()?;
        Ok(product)
    }

    /// Delete a product, returning an error if it does not exist
    pub fn delete_product(&self, sku: &str) -> ImsResult<()> {
        let changed = self.execute("DELETE FROM products WHERE sku = ?1", [sku])?;
        if changed == 0 {
            return Err(ImsError::product_not_found(sku));
        }
        Ok(())
    }

    /// List all products ordered by SKU
    pub fn list_products(&self) -> ImsResult<Vec<Product>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT sku, name, description, price_cents, stock_quantity
             FROM products ORDER BY sku",
        )?;
        let products = stmt
            .query_map([], Product::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }
}
