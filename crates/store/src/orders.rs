//! Order totals, in memory and in SQL

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::EphemeralDatabase;
use crate::{Result, StoreError};

/// One line of an order: how many units at which unit price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub quantity: u32,
    pub unit_price: u64,
}

impl OrderLine {
    pub fn new(quantity: u32, unit_price: u64) -> Self {
        Self { quantity, unit_price }
    }
}

/// `quantity × unit_price`, exact
pub fn order_total(line: &OrderLine) -> Result<u64> {
    line.unit_price
        .checked_mul(u64::from(line.quantity))
        .ok_or(StoreError::Overflow("order total"))
}

/// Sum of the line totals of every order
pub fn total_spent(lines: &[OrderLine]) -> Result<u64> {
    lines.iter().try_fold(0u64, |acc, line| {
        acc.checked_add(order_total(line)?)
            .ok_or(StoreError::Overflow("total spent"))
    })
}

/// A row for the `orders` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: u32,
    pub price: f64,
}

/// Insert an order and return the affected-row count
pub fn insert_order(db: &EphemeralDatabase, order: &NewOrder) -> Result<usize> {
    let rows = db.connection().execute(
        "INSERT INTO orders (customer_id, product_id, quantity, price) VALUES (?1, ?2, ?3, ?4)",
        params![order.customer_id, order.product_id, order.quantity, order.price],
    )?;
    Ok(rows)
}

/// `SUM(quantity * price)` over a user's rows in `order_view`.
///
/// A user with no orders has spent `0.0`.
pub fn total_spent_by(db: &EphemeralDatabase, username: &str) -> Result<f64> {
    let total: Option<f64> = db.connection().query_row(
        "SELECT SUM(quantity * price) FROM order_view WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(total.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ORDER_VIEW_SCHEMA, ORDER_VIEW_SEED};

    #[test]
    fn test_zero_quantity_costs_nothing() {
        assert_eq!(order_total(&OrderLine::new(0, 99)).unwrap(), 0);
    }

    #[test]
    fn test_overflow_is_reported() {
        let line = OrderLine::new(2, u64::MAX);
        assert!(matches!(order_total(&line), Err(StoreError::Overflow(_))));

        let lines = [OrderLine::new(1, u64::MAX), OrderLine::new(1, 1)];
        assert!(matches!(total_spent(&lines), Err(StoreError::Overflow(_))));
    }

    #[test]
    fn test_empty_history_spent_nothing() {
        assert_eq!(total_spent(&[]).unwrap(), 0);
    }

    #[test]
    fn test_unknown_user_spent_nothing() {
        let db = EphemeralDatabase::create(ORDER_VIEW_SCHEMA, Some(ORDER_VIEW_SEED)).unwrap();
        assert_eq!(total_spent_by(&db, "nobody").unwrap(), 0.0);
    }
}
