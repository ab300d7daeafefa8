//! CDN image discovery
//!
//! Product images live on one of many numbered "basket" hosts and there is
//! no endpoint telling which one. Discovery derives the routing prefixes from
//! the article id and probes shards in ascending order until one of them
//! serves an image.

use crate::config::WildberriesConfig;
use crate::limiter::RateLimiter;
use crate::scraper::ScrapeError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Ids at or above this value use the long routing split
const LONG_ROUTE_THRESHOLD: u64 = 100_000_000;

/// Routing prefixes of an article on the image CDN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardRoute {
    pub vol: String,
    pub part: String,
}

/// Derives the `vol`/`part` prefixes for an article id
///
/// Ids of at least 100,000,000 take their first 4 and 6 digits; smaller ids
/// take their first 3 and 5. Short ids yield whatever digits they have.
///
/// # Examples
///
/// ```
/// use pricelens::scraper::derive_route;
///
/// let route = derive_route(100000001);
/// assert_eq!(route.vol, "1000");
/// assert_eq!(route.part, "100000");
/// ```
pub fn derive_route(article: u64) -> ShardRoute {
    let digits = article.to_string();
    let (vol_len, part_len) = if article >= LONG_ROUTE_THRESHOLD {
        (4, 6)
    } else {
        (3, 5)
    };

    ShardRoute {
        vol: digits.chars().take(vol_len).collect(),
        part: digits.chars().take(part_len).collect(),
    }
}

/// Outcome of an image discovery run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLookup {
    Found(String),
    NotFound,
}

impl ImageLookup {
    /// The resolved URL, or an empty string when nothing was found
    pub fn into_url(self) -> String {
        match self {
            Self::Found(url) => url,
            Self::NotFound => String::new(),
        }
    }
}

/// Brute-force shard prober for one marketplace's image CDN
#[derive(Debug, Clone)]
pub struct ImageProbe {
    template: String,
    extension: String,
    max_shards: u8,
}

impl ImageProbe {
    pub fn new(template: impl Into<String>, extension: impl Into<String>, max_shards: u8) -> Self {
        Self {
            template: template.into(),
            extension: extension.into(),
            max_shards,
        }
    }

    pub fn from_config(config: &WildberriesConfig) -> Self {
        Self::new(
            config.image_template.clone(),
            config.image_extension.clone(),
            config.max_shards,
        )
    }

    /// Candidate image URL for `article` on `shard`
    pub fn candidate_url(&self, shard: u8, article: u64) -> String {
        let route = derive_route(article);
        self.template
            .replace("{shard}", &format!("{:02}", shard))
            .replace("{vol}", &route.vol)
            .replace("{part}", &route.part)
            .replace("{article}", &article.to_string())
            .replace("{ext}", &self.extension)
    }

    /// Probes shards in ascending order until one serves the image
    ///
    /// Each probe is admitted by `limiter` with weight 1 and its status is
    /// reported back afterwards. Running out of shards yields
    /// `ImageLookup::NotFound`.
    ///
    /// # Errors
    ///
    /// * `ScrapeError::ProbeTransport` - A probe failed below HTTP
    /// * `ScrapeError::Limiter` - The limiter can never admit a probe
    pub async fn discover(
        &self,
        client: &Client,
        limiter: &RateLimiter,
        article: u64,
    ) -> Result<ImageLookup, ScrapeError> {
        for shard in 1..=self.max_shards {
            let url = self.candidate_url(shard, article);

            limiter.acquire(1).await?;
            let response = match client.get(&url).send().await {
                Ok(response) => response,
                Err(source) => {
                    warn!(shard, url = %url, article, "Image probe failed: {}", source);
                    return Err(ScrapeError::ProbeTransport { shard, url, source });
                }
            };

            let status = response.status();
            limiter.record_response(status.as_u16(), 1).await;

            if status == StatusCode::OK && is_image(&response) {
                debug!(shard, article, "Found image at {}", url);
                return Ok(ImageLookup::Found(url));
            }
        }

        debug!(article, shards = self.max_shards, "No shard served an image");
        Ok(ImageLookup::NotFound)
    }
}

fn is_image(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().to_ascii_lowercase().starts_with("image/"))
}
