//! PriceLens: rate-governed marketplace scraping
//!
//! This crate fetches product cards from marketplace APIs, discovers their CDN
//! images, and normalizes every size of a product into a price record. All
//! outbound traffic for a marketplace passes through one dual-window rate
//! limiter so the provider never sees more than the configured budget.

pub mod config;
pub mod limiter;
pub mod output;
pub mod product;
pub mod scraper;
pub mod storage;

use thiserror::Error;

/// Main error type for PriceLens operations
#[derive(Debug, Error)]
pub enum PricelensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] scraper::ScrapeError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No scraper registered for marketplace '{0}'")]
    UnknownMarketplace(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL template: {0}")]
    InvalidTemplate(String),
}

/// Errors raised while turning user input into a product identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Product identifier is empty")]
    Empty,

    #[error("Failed to parse product URL '{0}'")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    InvalidScheme(String),

    #[error("No numeric article id in '{0}'")]
    MissingArticle(String),

    #[error("Unknown marketplace host: {0}")]
    UnknownHost(String),
}

// Re-export commonly used types
pub use config::Config;
pub use limiter::RateLimiter;
pub use product::{Marketplace, ProductIdentifier, ProductVariant};
pub use scraper::{Coordinator, Scraper};
