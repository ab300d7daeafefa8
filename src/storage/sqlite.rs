//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProductRepository trait.

use crate::product::{Marketplace, ProductVariant};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ProductRepository, StorageError, StorageResult};
use crate::storage::{PriceHistorySummary, PricePoint, StoredProduct};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

const PRODUCT_COLUMNS: &str = "id, internal_id, marketplace, name, brand, brand_id, image_url, \
     size, quantity, pics, created_at, last_scraped_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_sql_id(value: u64) -> StorageResult<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::Database(format!("Id {} does not fit in INTEGER", value)))
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<StoredProduct> {
    Ok(StoredProduct {
        id: row.get(0)?,
        internal_id: row.get::<_, i64>(1)? as u64,
        marketplace: row.get(2)?,
        name: row.get(3)?,
        brand: row.get(4)?,
        brand_id: row.get::<_, Option<i64>>(5)?.map(|id| id as u64),
        image_url: row.get(6)?,
        size: row.get(7)?,
        quantity: row.get(8)?,
        pics: row.get(9)?,
        created_at: row.get(10)?,
        last_scraped_at: row.get(11)?,
    })
}

impl ProductRepository for SqliteStorage {
    // ===== Products =====

    fn get_or_create_product(&mut self, variant: &ProductVariant) -> StorageResult<i64> {
        let internal_id = to_sql_id(variant.internal_id)?;
        let brand_id = variant.brand_id.map(to_sql_id).transpose()?;
        let marketplace = variant.marketplace.as_str();
        let now = timestamp(Utc::now());

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM products WHERE internal_id = ?1 AND marketplace = ?2 AND size = ?3",
                params![internal_id, marketplace, variant.size],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            self.conn.execute(
                "UPDATE products
                 SET name = ?1, brand = ?2, brand_id = ?3, image_url = ?4,
                     quantity = ?5, pics = ?6, last_scraped_at = ?7
                 WHERE id = ?8",
                params![
                    variant.name,
                    variant.brand,
                    brand_id,
                    variant.image_url,
                    variant.quantity,
                    variant.pics,
                    now,
                    id
                ],
            )?;
            debug!(
                "Updated product {} ({}:{}:{})",
                id, marketplace, variant.internal_id, variant.size
            );
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO products (
                internal_id, marketplace, name, brand, brand_id, image_url,
                size, quantity, pics, created_at, last_scraped_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                internal_id,
                marketplace,
                variant.name,
                variant.brand,
                brand_id,
                variant.image_url,
                variant.size,
                variant.quantity,
                variant.pics,
                now
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(
            "Created product {} ({}:{}:{})",
            id, marketplace, variant.internal_id, variant.size
        );
        Ok(id)
    }

    fn insert_price(
        &mut self,
        product_id: i64,
        price: f64,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO prices (product_id, timestamp, price) VALUES (?1, ?2, ?3)
             ON CONFLICT (product_id, timestamp) DO UPDATE SET price = excluded.price",
            params![product_id, timestamp(at), price],
        )?;
        debug!("Recorded price {} for product {}", price, product_id);
        Ok(())
    }

    fn get_product(&self, product_id: i64) -> StorageResult<StoredProduct> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        self.conn
            .query_row(&sql, params![product_id], product_from_row)
            .optional()?
            .ok_or_else(|| StorageError::ProductNotFound(format!("Product ID {}", product_id)))
    }

    fn get_product_by_internal_id(
        &self,
        internal_id: u64,
        marketplace: Marketplace,
        size: Option<&str>,
    ) -> StorageResult<Option<StoredProduct>> {
        let internal_id = to_sql_id(internal_id)?;
        let product = match size {
            Some(size) => {
                let sql = format!(
                    "SELECT {} FROM products WHERE internal_id = ?1 AND marketplace = ?2 AND size = ?3",
                    PRODUCT_COLUMNS
                );
                self.conn
                    .query_row(
                        &sql,
                        params![internal_id, marketplace.as_str(), size],
                        product_from_row,
                    )
                    .optional()?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM products WHERE internal_id = ?1 AND marketplace = ?2
                     ORDER BY id LIMIT 1",
                    PRODUCT_COLUMNS
                );
                self.conn
                    .query_row(
                        &sql,
                        params![internal_id, marketplace.as_str()],
                        product_from_row,
                    )
                    .optional()?
            }
        };
        Ok(product)
    }

    // ===== Prices =====

    fn get_price_history(
        &self,
        product_id: i64,
        limit: Option<u32>,
    ) -> StorageResult<Vec<PricePoint>> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, i64::from);
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, price FROM prices WHERE product_id = ?1
             ORDER BY timestamp DESC LIMIT ?2",
        )?;

        let points = stmt
            .query_map(params![product_id, limit], |row| {
                Ok(PricePoint {
                    timestamp: row.get(0)?,
                    price: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(points)
    }

    fn get_latest_price(&self, product_id: i64) -> StorageResult<Option<f64>> {
        let price = self
            .conn
            .query_row(
                "SELECT price FROM prices WHERE product_id = ?1 ORDER BY timestamp DESC LIMIT 1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(price)
    }

    // ===== Statistics =====

    fn count_products(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_prices(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM prices", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_products_with_prices(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT product_id) FROM prices",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_by_marketplace(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT marketplace, COUNT(*) AS count FROM products
             GROUP BY marketplace ORDER BY count DESC, marketplace",
        )?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn get_recent_products(&self, limit: u32) -> StorageResult<Vec<StoredProduct>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY last_scraped_at DESC, id DESC LIMIT ?1",
            PRODUCT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![limit], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    fn get_products_updated_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<Vec<StoredProduct>> {
        let sql = format!(
            "SELECT {} FROM products WHERE last_scraped_at >= ?1
             ORDER BY last_scraped_at DESC, id DESC",
            PRODUCT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![timestamp(cutoff)], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    fn get_products_with_price_history(
        &self,
        limit: u32,
    ) -> StorageResult<Vec<PriceHistorySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.brand, p.marketplace,
                    COUNT(pr.timestamp) AS price_count,
                    MIN(pr.price), MAX(pr.price), MAX(pr.timestamp) AS last_update
             FROM products p
             JOIN prices pr ON p.id = pr.product_id
             GROUP BY p.id
             ORDER BY price_count DESC, last_update DESC
             LIMIT ?1",
        )?;

        let summaries = stmt
            .query_map(params![limit], |row| {
                Ok(PriceHistorySummary {
                    product_id: row.get(0)?,
                    name: row.get(1)?,
                    brand: row.get(2)?,
                    marketplace: row.get(3)?,
                    price_count: row.get::<_, i64>(4)? as u64,
                    min_price: row.get(5)?,
                    max_price: row.get(6)?,
                    last_price_update: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }
}

/// Opens a database file and prepares it for use
///
/// Applies the connection pragmas and creates any missing tables.
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
