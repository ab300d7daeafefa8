//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the PriceLens database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per product size
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    internal_id INTEGER NOT NULL,
    marketplace TEXT NOT NULL,
    name TEXT NOT NULL,
    brand TEXT NOT NULL DEFAULT '',
    brand_id INTEGER,
    image_url TEXT NOT NULL DEFAULT '',
    size TEXT NOT NULL DEFAULT '',
    quantity INTEGER NOT NULL DEFAULT 0,
    pics INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    last_scraped_at TEXT NOT NULL,
    UNIQUE(internal_id, marketplace, size)
);

CREATE INDEX IF NOT EXISTS idx_products_marketplace ON products(marketplace);
CREATE INDEX IF NOT EXISTS idx_products_scraped ON products(last_scraped_at);

-- Append-only price observations
CREATE TABLE IF NOT EXISTS prices (
    product_id INTEGER NOT NULL REFERENCES products(id),
    timestamp TEXT NOT NULL,
    price REAL NOT NULL,
    PRIMARY KEY (product_id, timestamp)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
