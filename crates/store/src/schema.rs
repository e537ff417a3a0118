//! Literal schemas and seed data used by the store checks

/// Orders placed by customers
pub const ORDERS_SCHEMA: &str = r#"
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        price REAL NOT NULL
    );
"#;

/// Catalogue products
pub const PRODUCTS_SCHEMA: &str = r#"
    CREATE TABLE products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        price REAL,
        category_id INTEGER
    );
"#;

/// Denormalized order history as shown on a user's profile
pub const ORDER_VIEW_SCHEMA: &str = r#"
    CREATE TABLE order_view (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL,
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        price REAL NOT NULL
    );
"#;

/// Two orders for `john` worth 2 x 15.0 + 1 x 20.0
pub const ORDER_VIEW_SEED: &str = r#"
    INSERT INTO order_view (id, username, product_id, quantity, price)
    VALUES (1, 'john', 1, 2, 15.0),
           (2, 'john', 2, 1, 20.0);
"#;
