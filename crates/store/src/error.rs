//! Error types for the store checks

use thiserror::Error;

/// Result type alias using [`StoreError`]
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed schema/seed/query text or a constraint violation
    #[error("Database execution error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}
