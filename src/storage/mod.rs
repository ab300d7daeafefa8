//! Storage module for persisting scraped products
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Product upserts keyed by marketplace, article and size
//! - Append-only price history
//! - Aggregate queries for reporting

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{ProductRepository, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a product row in the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub id: i64,
    pub internal_id: u64,
    pub marketplace: String,
    pub name: String,
    pub brand: String,
    pub brand_id: Option<u64>,
    pub image_url: String,
    pub size: String,
    pub quantity: u32,
    pub pics: u32,
    pub created_at: String,
    pub last_scraped_at: String,
}

/// One price observation
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: String,
    pub price: f64,
}

/// Price history aggregate of one product
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistorySummary {
    pub product_id: i64,
    pub name: String,
    pub brand: String,
    pub marketplace: String,
    pub price_count: u64,
    pub min_price: f64,
    pub max_price: f64,
    pub last_price_update: String,
}
