//! Wildberries product scraper

use crate::config::{RateLimitConfig, WildberriesConfig};
use crate::limiter::RateLimiter;
use crate::product::{Marketplace, ProductIdentifier, ProductVariant};
use crate::scraper::{
    response_snippet, ImageLookup, ImageProbe, ProductParser, ScrapeError, Scraper,
    WILDBERRIES_LAYOUT,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument, Span};

/// Weight charged for one detail request or one image probe
const REQUEST_WEIGHT: u32 = 1;

/// Scraper for the Wildberries card API and basket CDN
///
/// Owns a private [`RateLimiter`] shared by its detail requests and image
/// probes.
#[derive(Debug)]
pub struct WildberriesScraper {
    detail_endpoint: String,
    limiter: RateLimiter,
    parser: ProductParser,
    images: ImageProbe,
    span: Span,
}

impl WildberriesScraper {
    pub fn new(config: &WildberriesConfig, rate_limit: &RateLimitConfig) -> Self {
        Self {
            detail_endpoint: config.detail_endpoint.clone(),
            limiter: RateLimiter::new(rate_limit),
            parser: ProductParser::new(Marketplace::Wildberries, WILDBERRIES_LAYOUT),
            images: ImageProbe::from_config(config),
            span: info_span!("scraper", marketplace = %Marketplace::Wildberries),
        }
    }

    /// Detail endpoint URL for `article`
    pub fn detail_url(&self, article: u64) -> String {
        format!("{}{}", self.detail_endpoint, article)
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    async fn fetch_card(&self, client: &Client, article: u64) -> Result<Value, ScrapeError> {
        let url = self.detail_url(article);

        self.limiter.acquire(REQUEST_WEIGHT).await?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|source| ScrapeError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        self.limiter
            .record_response(status.as_u16(), REQUEST_WEIGHT)
            .await;

        if status != StatusCode::OK {
            // The status is the error; an unreadable body only loses the snippet
            let snippet = match response.text().await {
                Ok(body) => response_snippet(&body),
                Err(e) => {
                    debug!(article, "Could not read error body: {}", e);
                    String::new()
                }
            };
            return Err(ScrapeError::UnexpectedStatus {
                marketplace: Marketplace::Wildberries,
                article,
                status: status.as_u16(),
                snippet,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ScrapeError::Transport {
                url: url.clone(),
                source,
            })?;

        serde_json::from_str(&body).map_err(|e| ScrapeError::MalformedResponse {
            marketplace: Marketplace::Wildberries,
            article,
            message: format!("invalid JSON: {}", e),
        })
    }

    async fn scrape(
        &self,
        client: &Client,
        identifier: &ProductIdentifier,
    ) -> Result<Vec<ProductVariant>, ScrapeError> {
        let article = identifier.article_id()?;
        debug!(article, "Fetching product card");

        let card = self.fetch_card(client, article).await?;
        let mut variants = self.parser.parse(article, &card)?;

        let image_url = match self.images.discover(client, &self.limiter, article).await {
            Ok(ImageLookup::Found(url)) => url,
            Ok(ImageLookup::NotFound) => {
                debug!(article, "No image found");
                String::new()
            }
            Err(e) => {
                warn!(article, "Image discovery failed: {}", e);
                String::new()
            }
        };

        for variant in &mut variants {
            variant.image_url = image_url.clone();
        }

        info!(article, sizes = variants.len(), "Fetched product");
        Ok(variants)
    }
}

#[async_trait]
impl Scraper for WildberriesScraper {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Wildberries
    }

    async fn fetch_product(
        &self,
        client: &Client,
        identifier: &ProductIdentifier,
    ) -> Result<Vec<ProductVariant>, ScrapeError> {
        self.scrape(client, identifier)
            .instrument(self.span.clone())
            .await
    }
}
