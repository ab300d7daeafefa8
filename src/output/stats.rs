//! Statistics generation from the product database
//!
//! This module provides functionality for extracting and displaying
//! repository statistics from the storage layer.

use crate::storage::{PriceHistorySummary, ProductRepository, StorageResult, StoredProduct};
use chrono::{DateTime, Duration, Utc};

/// How many recently scraped products the report lists
pub const RECENT_PRODUCTS: u32 = 10;

/// How many products with price history the report lists
pub const TOP_PRICE_HISTORIES: u32 = 5;

/// How far back the "recently updated" section looks
pub const RECENT_UPDATE_HOURS: i64 = 24;

/// How many recently updated products the report names
pub const RECENTLY_UPDATED_SHOWN: usize = 5;

/// Repository statistics summary
#[derive(Debug, Clone)]
pub struct RepositoryStatistics {
    /// Total number of stored product sizes
    pub total_products: u64,

    /// Products with at least one price observation
    pub products_with_prices: u64,

    /// Total number of price observations
    pub total_prices: u64,

    /// Product counts per marketplace, largest first
    pub by_marketplace: Vec<(String, u64)>,

    /// Most recently scraped products
    pub recent_products: Vec<StoredProduct>,

    /// Products with the longest price histories
    pub price_histories: Vec<PriceHistorySummary>,

    /// Products scraped within the last `RECENT_UPDATE_HOURS`, newest first
    pub recently_updated: Vec<StoredProduct>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The repository to query
///
/// # Returns
///
/// * `Ok(RepositoryStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn ProductRepository) -> StorageResult<RepositoryStatistics> {
    load_statistics_at(storage, Utc::now())
}

/// Loads statistics with the recent-update window ending at `now`
pub fn load_statistics_at(
    storage: &dyn ProductRepository,
    now: DateTime<Utc>,
) -> StorageResult<RepositoryStatistics> {
    let cutoff = now - Duration::hours(RECENT_UPDATE_HOURS);

    Ok(RepositoryStatistics {
        total_products: storage.count_products()?,
        products_with_prices: storage.count_products_with_prices()?,
        total_prices: storage.count_prices()?,
        by_marketplace: storage.count_by_marketplace()?,
        recent_products: storage.get_recent_products(RECENT_PRODUCTS)?,
        price_histories: storage.get_products_with_price_history(TOP_PRICE_HISTORIES)?,
        recently_updated: storage.get_products_updated_since(cutoff)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RepositoryStatistics) {
    println!("=== Repository Statistics ===\n");

    println!("Overview:");
    println!("  Total products: {}", stats.total_products);
    println!("  Products with prices: {}", stats.products_with_prices);
    println!("  Price observations: {}", stats.total_prices);
    println!();

    if !stats.by_marketplace.is_empty() {
        println!("By Marketplace:");
        for (marketplace, count) in &stats.by_marketplace {
            let percentage = if stats.total_products > 0 {
                (*count as f64 / stats.total_products as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", marketplace, count, percentage);
        }
        println!();
    }

    println!("Recently Scraped (top {}):", RECENT_PRODUCTS);
    if stats.recent_products.is_empty() {
        println!("  No products found");
    }
    for (i, product) in stats.recent_products.iter().enumerate() {
        println!("  {}. {}", i + 1, product.name);
        println!(
            "     ID: {} | Marketplace: {} | Article: {}",
            product.id, product.marketplace, product.internal_id
        );
        println!(
            "     Brand: {} | Size: {} | Quantity: {}",
            product.brand, product.size, product.quantity
        );
        println!("     Updated: {}", product.last_scraped_at);
    }
    println!();

    println!("Price History (top {}):", TOP_PRICE_HISTORIES);
    if stats.price_histories.is_empty() {
        println!("  No products with price history");
    }
    for (i, summary) in stats.price_histories.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, summary.name, summary.brand);
        println!(
            "     Marketplace: {} | Observations: {}",
            summary.marketplace, summary.price_count
        );
        println!(
            "     Range: {:.2} - {:.2}",
            summary.min_price, summary.max_price
        );
        println!("     Last update: {}", summary.last_price_update);
    }
    println!();

    println!(
        "Updated in the last {} hours: {}",
        RECENT_UPDATE_HOURS,
        stats.recently_updated.len()
    );
    for product in stats.recently_updated.iter().take(RECENTLY_UPDATED_SHOWN) {
        println!(
            "  - {} ({}) at {}",
            product.name, product.size, product.last_scraped_at
        );
    }
    if stats.recently_updated.len() > RECENTLY_UPDATED_SHOWN {
        println!(
            "  ... and {} more",
            stats.recently_updated.len() - RECENTLY_UPDATED_SHOWN
        );
    }
}
