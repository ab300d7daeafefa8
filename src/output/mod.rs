//! Output module for presenting scrape results
//!
//! This module handles:
//! - Printing scraped product variants
//! - Reporting repository statistics

pub mod stats;

pub use stats::{load_statistics, load_statistics_at, print_statistics, RepositoryStatistics};

use crate::product::ProductVariant;

/// Prints the variants of one product, one line per size
///
/// # Arguments
///
/// * `variants` - Every size of one product
pub fn print_variants(variants: &[ProductVariant]) {
    let Some(first) = variants.first() else {
        return;
    };

    println!(
        "{} | {} ({}) [{}]",
        first.internal_id, first.name, first.brand, first.marketplace
    );
    if !first.image_url.is_empty() {
        println!("  image: {}", first.image_url);
    }
    for variant in variants {
        println!("  {}", format_variant(variant));
    }
}

/// Formats one size as a single line
pub fn format_variant(variant: &ProductVariant) -> String {
    let size = if variant.size.is_empty() {
        "-"
    } else {
        variant.size.as_str()
    };

    if variant.is_available() {
        format!(
            "size {}: {:.2} (was {:.2}), {} in stock",
            size, variant.price, variant.price_basic, variant.quantity
        )
    } else {
        format!("size {}: unavailable", size)
    }
}
