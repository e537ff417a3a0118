//! ShopTester Store Checks
//!
//! Order and product logic for the shop, plus throwaway in-memory SQLite
//! databases for asserting SQL behaviour. Every `EphemeralDatabase` is built
//! from literal schema text and dropped with the test that created it.

pub mod db;
pub mod error;
pub mod orders;
pub mod products;
pub mod schema;

pub use db::EphemeralDatabase;
pub use error::{Result, StoreError};
pub use orders::{order_total, total_spent, OrderLine};
pub use products::NewProduct;
