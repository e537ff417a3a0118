//! Product creation rules

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::EphemeralDatabase;
use crate::{Result, StoreError};

/// A product about to be added to the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub category_id: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64, category_id: i64) -> Self {
        Self {
            name: name.into(),
            price,
            category_id,
        }
    }

    /// A product needs a non-blank name, a positive price and a positive
    /// category id.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidProduct("name is blank".to_string()));
        }
        if self.price.is_nan() || self.price <= 0.0 {
            return Err(StoreError::InvalidProduct(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        if self.category_id <= 0 {
            return Err(StoreError::InvalidProduct(format!(
                "category id must be positive, got {}",
                self.category_id
            )));
        }
        Ok(())
    }
}

/// Validate and insert a product, returning the affected-row count
pub fn insert_product(db: &EphemeralDatabase, product: &NewProduct) -> Result<usize> {
    product.validate()?;
    let rows = db.connection().execute(
        "INSERT INTO products (name, price, category_id) VALUES (?1, ?2, ?3)",
        params![product.name, product.price, product.category_id],
    )?;
    Ok(rows)
}

/// Delete every product with this name, returning the affected-row count
pub fn delete_product_by_name(db: &EphemeralDatabase, name: &str) -> Result<usize> {
    let rows = db
        .connection()
        .execute("DELETE FROM products WHERE name = ?1", params![name])?;
    Ok(rows)
}
