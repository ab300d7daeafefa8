//! Scraper module for marketplace product fetching
//!
//! This module contains the core scraping logic, including:
//! - The per-marketplace [`Scraper`] capability
//! - HTTP client construction
//! - Layout-driven product card parsing
//! - Brute-force CDN image discovery
//! - Orchestration across marketplaces with bounded retries

mod coordinator;
mod fetcher;
mod images;
mod parser;
mod wildberries;

pub use coordinator::{Coordinator, ScrapeReport};
pub use fetcher::{build_http_client, response_snippet, SNIPPET_LIMIT};
pub use images::{derive_route, ImageLookup, ImageProbe, ShardRoute};
pub use parser::{ProductLayout, ProductParser, WILDBERRIES_LAYOUT};
pub use wildberries::WildberriesScraper;

use crate::limiter::LimiterError;
use crate::product::{Marketplace, ProductIdentifier, ProductVariant};
use crate::IdentifierError;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Errors raised while scraping a single product
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Unexpected status {status} from {marketplace} for article {article}: {snippet}")]
    UnexpectedStatus {
        marketplace: Marketplace,
        article: u64,
        status: u16,
        snippet: String,
    },

    #[error("Malformed {marketplace} response for article {article}: {message}")]
    MalformedResponse {
        marketplace: Marketplace,
        article: u64,
        message: String,
    },

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Image probe failed on shard {shard:02} ({url}): {source}")]
    ProbeTransport {
        shard: u8,
        url: String,
        source: reqwest::Error,
    },

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Rate limiter refused request: {0}")]
    Limiter(#[from] LimiterError),
}

impl ScrapeError {
    /// Whether retrying the same product later could succeed
    ///
    /// Transport failures, server errors and throttling statuses are
    /// transient. Bad identifiers, limiter misconfiguration, other client
    /// errors and unparsable payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::ProbeTransport { .. } => true,
            Self::UnexpectedStatus { status, .. } => {
                *status >= 500 || matches!(*status, 408 | 409 | 429)
            }
            Self::MalformedResponse { .. } | Self::Identifier(_) | Self::Limiter(_) => false,
        }
    }
}

/// Marketplace-specific product fetching
///
/// Implementations own whatever per-marketplace state they need (endpoints,
/// field layout, rate limiter); the HTTP client is lent per call by the
/// orchestrator.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// The marketplace this scraper talks to
    fn marketplace(&self) -> Marketplace;

    /// Fetches one product and returns one variant per size
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to send requests with
    /// * `identifier` - Article id or catalog URL of the product
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ProductVariant>)` - Every size of the product
    /// * `Err(ScrapeError)` - The product could not be fetched or parsed
    async fn fetch_product(
        &self,
        client: &Client,
        identifier: &ProductIdentifier,
    ) -> Result<Vec<ProductVariant>, ScrapeError>;
}
