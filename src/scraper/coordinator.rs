//! Scrape coordinator - product fetch orchestration
//!
//! This module routes each product identifier to the scraper of its
//! marketplace, including:
//! - Owning the shared HTTP client
//! - Bounded concurrent fetching
//! - Retrying transient failures with linear backoff
//! - Handing results to the repository

use crate::config::Config;
use crate::product::{Marketplace, ProductIdentifier, ProductVariant};
use crate::scraper::{build_http_client, Scraper, WildberriesScraper};
use crate::storage::ProductRepository;
use crate::PricelensError;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a scrape-and-save run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeReport {
    /// Number of identifiers requested
    pub requested: usize,
    /// Products fetched successfully
    pub succeeded: usize,
    /// Identifiers that still failed after retrying, with the last error
    pub failed: Vec<(String, String)>,
    /// Row IDs of every saved variant
    pub saved_ids: Vec<i64>,
    /// Variants of each product fetched, in input order
    pub products: Vec<Vec<ProductVariant>>,
}

/// Main scrape coordinator structure
pub struct Coordinator {
    client: Client,
    scrapers: HashMap<Marketplace, Box<dyn Scraper>>,
    default_marketplace: Marketplace,
    max_concurrent: usize,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl Coordinator {
    /// Creates a coordinator with every built-in scraper registered
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(PricelensError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, PricelensError> {
        let client = build_http_client(&config.http)?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a coordinator around an existing HTTP client
    pub fn with_client(config: &Config, client: Client) -> Self {
        let mut coordinator = Self {
            client,
            scrapers: HashMap::new(),
            default_marketplace: config.scraper.default_marketplace,
            max_concurrent: config.scraper.max_concurrent_fetches.max(1) as usize,
            max_attempts: config.scraper.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.scraper.retry_backoff_ms),
        };

        coordinator.register(Box::new(WildberriesScraper::new(
            &config.wildberries,
            &config.rate_limit,
        )));

        coordinator
    }

    /// Registers a scraper, replacing any previous one for its marketplace
    pub fn register(&mut self, scraper: Box<dyn Scraper>) -> Option<Box<dyn Scraper>> {
        self.scrapers.insert(scraper.marketplace(), scraper)
    }

    /// Picks the scraper responsible for `identifier`
    ///
    /// Catalog URLs are routed by host; bare article ids go to the default
    /// marketplace.
    pub fn scraper_for(&self, identifier: &ProductIdentifier) -> Result<&dyn Scraper, PricelensError> {
        let marketplace = identifier
            .marketplace()?
            .unwrap_or(self.default_marketplace);

        self.scrapers
            .get(&marketplace)
            .map(|scraper| &**scraper)
            .ok_or_else(|| PricelensError::UnknownMarketplace(marketplace.to_string()))
    }

    /// Fetches one product once
    pub async fn fetch_product(
        &self,
        identifier: &ProductIdentifier,
    ) -> Result<Vec<ProductVariant>, PricelensError> {
        let scraper = self.scraper_for(identifier)?;
        Ok(scraper.fetch_product(&self.client, identifier).await?)
    }

    /// Fetches several products concurrently
    ///
    /// At most `max-concurrent-fetches` fetches are in flight. Results come
    /// back in input order.
    pub async fn fetch_many(
        &self,
        identifiers: &[ProductIdentifier],
    ) -> Vec<Result<Vec<ProductVariant>, PricelensError>> {
        stream::iter(identifiers)
            .map(|identifier| self.fetch_product(identifier))
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Fetches one product, retrying transient failures
    ///
    /// The wait before attempt `n + 1` is `retry-backoff-ms * n`.
    pub async fn fetch_with_retry(
        &self,
        identifier: &ProductIdentifier,
    ) -> Result<Vec<ProductVariant>, PricelensError> {
        let mut attempt = 1;
        loop {
            match self.fetch_product(identifier).await {
                Ok(variants) => return Ok(variants),
                Err(PricelensError::Scrape(e)) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.retry_backoff * attempt;
                    warn!(
                        identifier = %identifier,
                        attempt,
                        max_attempts = self.max_attempts,
                        "Fetch failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetches every product and saves the variants
    ///
    /// A product that still fails after retrying is logged and skipped; it
    /// never aborts the run.
    pub async fn scrape_and_save(
        &self,
        identifiers: &[ProductIdentifier],
        repository: &mut dyn ProductRepository,
    ) -> ScrapeReport {
        let mut report = ScrapeReport {
            requested: identifiers.len(),
            ..ScrapeReport::default()
        };

        let mut results = stream::iter(identifiers)
            .map(|identifier| async move { (identifier, self.fetch_with_retry(identifier).await) })
            .buffered(self.max_concurrent);

        while let Some((identifier, result)) = results.next().await {
            match result {
                Ok(variants) => {
                    report.succeeded += 1;
                    report.saved_ids.extend(repository.save_products(&variants));
                    report.products.push(variants);
                }
                Err(e) => {
                    warn!(identifier = %identifier, "Skipping product: {}", e);
                    report.failed.push((identifier.to_string(), e.to_string()));
                }
            }
        }

        info!(
            "Scraped {}/{} products, saved {} variants",
            report.succeeded,
            report.requested,
            report.saved_ids.len()
        );
        report
    }
}
