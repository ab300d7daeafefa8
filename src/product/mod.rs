//! Product model shared by every marketplace
//!
//! A scrape turns one marketplace product into a list of [`ProductVariant`]
//! values, one per size. Downstream storage identifies a variant by
//! `(marketplace, internal_id, size)`.

mod identifier;

pub use identifier::{extract_article, ProductIdentifier};

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Supported marketplaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Wildberries,
}

impl Marketplace {
    pub const ALL: [Marketplace; 1] = [Marketplace::Wildberries];

    /// Stable name used in storage and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wildberries => "wildberries",
        }
    }

    /// Hosts whose catalog URLs belong to this marketplace
    fn hosts(&self) -> &'static [&'static str] {
        match self {
            Self::Wildberries => &["wildberries.ru", "wb.ru"],
        }
    }

    /// Detects the marketplace serving a catalog host (subdomains included)
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        Self::ALL.into_iter().find(|marketplace| {
            marketplace.hosts().iter().any(|known| {
                host == *known
                    || host
                        .strip_suffix(known)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
        })
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marketplace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|marketplace| marketplace.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// One size of one product, as scraped
#[derive(Debug, Clone, PartialEq)]
pub struct ProductVariant {
    pub marketplace: Marketplace,
    pub internal_id: u64,
    pub name: String,
    pub brand: String,
    pub brand_id: Option<u64>,
    /// Price before discounts; zero when the size has no offer
    pub price_basic: f64,
    /// Current selling price; zero when the size has no offer
    pub price: f64,
    pub size: String,
    pub quantity: u32,
    /// Resolved CDN image, empty when discovery found nothing
    pub image_url: String,
    pub pics: u32,
}

impl ProductVariant {
    /// Whether this size currently has an offer
    pub fn is_available(&self) -> bool {
        self.price > 0.0
    }
}

/// Rounds a monetary amount to two decimals
pub fn round_price(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
