//! Storage traits and error types
//!
//! This module defines the repository interface scraped products are handed
//! to, and its error types.

use crate::product::{Marketplace, ProductVariant};
use crate::storage::{PriceHistorySummary, PricePoint, StoredProduct};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence for scraped product variants and their price history
///
/// A stored product is identified by `(marketplace, internal_id, size)`.
/// Saving the same variant again refreshes its row and appends a price point.
pub trait ProductRepository {
    // ===== Products =====

    /// Inserts a variant or refreshes the existing row
    ///
    /// # Returns
    ///
    /// The product row ID (either newly created or existing)
    fn get_or_create_product(&mut self, variant: &ProductVariant) -> StorageResult<i64>;

    /// Records a price observation
    ///
    /// A second observation with the same timestamp replaces the first.
    fn insert_price(
        &mut self,
        product_id: i64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Gets a product by row ID
    fn get_product(&self, product_id: i64) -> StorageResult<StoredProduct>;

    /// Gets a product by marketplace id, optionally narrowed to one size
    fn get_product_by_internal_id(
        &self,
        internal_id: u64,
        marketplace: Marketplace,
        size: Option<&str>,
    ) -> StorageResult<Option<StoredProduct>>;

    // ===== Prices =====

    /// Price observations of a product, newest first
    fn get_price_history(
        &self,
        product_id: i64,
        limit: Option<u32>,
    ) -> StorageResult<Vec<PricePoint>>;

    /// Most recent observed price of a product
    fn get_latest_price(&self, product_id: i64) -> StorageResult<Option<f64>>;

    // ===== Statistics =====

    fn count_products(&self) -> StorageResult<u64>;

    fn count_prices(&self) -> StorageResult<u64>;

    /// Number of products with at least one price observation
    fn count_products_with_prices(&self) -> StorageResult<u64>;

    /// Product counts per marketplace, largest first
    fn count_by_marketplace(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Most recently scraped products
    fn get_recent_products(&self, limit: u32) -> StorageResult<Vec<StoredProduct>>;

    /// Products scraped at or after `cutoff`, newest first
    fn get_products_updated_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<Vec<StoredProduct>>;

    /// Products with the longest price histories
    fn get_products_with_price_history(
        &self,
        limit: u32,
    ) -> StorageResult<Vec<PriceHistorySummary>>;

    // ===== Provided =====

    /// Saves one variant and records its price when it has an offer
    fn save_product(&mut self, variant: &ProductVariant) -> StorageResult<i64> {
        let product_id = self.get_or_create_product(variant)?;
        if variant.price > 0.0 {
            self.insert_price(product_id, variant.price, Utc::now())?;
        } else {
            debug!(
                product_id,
                size = %variant.size,
                "No offer, skipping price point"
            );
        }
        Ok(product_id)
    }

    /// Saves every variant, skipping the ones that fail
    ///
    /// # Returns
    ///
    /// Row IDs of the variants that were saved, in input order
    fn save_products(&mut self, variants: &[ProductVariant]) -> Vec<i64> {
        let mut saved = Vec::with_capacity(variants.len());
        for variant in variants {
            match self.save_product(variant) {
                Ok(id) => saved.push(id),
                Err(e) => error!(
                    internal_id = variant.internal_id,
                    size = %variant.size,
                    "Failed to save product: {}",
                    e
                ),
            }
        }
        info!("Saved {} of {} products", saved.len(), variants.len());
        saved
    }
}
