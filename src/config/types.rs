use crate::product::Marketplace;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for PriceLens
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub wildberries: WildberriesConfig,
    pub output: OutputConfig,
}

/// Orchestration behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Marketplace used for bare numeric article ids
    #[serde(rename = "default-marketplace", default = "default_marketplace")]
    pub default_marketplace: Marketplace,

    /// Maximum number of product fetches in flight at once
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: u32,

    /// Attempts per product before it is skipped
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts (milliseconds), multiplied by the attempt number
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            default_marketplace: default_marketplace(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Dual-window admission budget for one marketplace
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the sustained-rate window (seconds)
    #[serde(default = "default_period")]
    pub period: f64,

    /// Maximum weight admitted per period
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Length of the burst window (seconds)
    #[serde(default = "default_interval")]
    pub interval: f64,

    /// Maximum weight admitted per interval
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// HTTP status the provider uses to signal throttling
    #[serde(rename = "penalized-status", default = "default_penalized_status")]
    pub penalized_status: u16,

    /// True cost of a request that came back with the penalized status
    #[serde(rename = "penalty-weight", default = "default_penalty_weight")]
    pub penalty_weight: u32,
}

impl RateLimitConfig {
    pub fn period_duration(&self) -> Duration {
        Duration::from_secs_f64(self.period)
    }

    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            limit: default_limit(),
            interval: default_interval(),
            burst: default_burst(),
            penalized_status: default_penalized_status(),
            penalty_weight: default_penalty_weight(),
        }
    }
}

/// Outbound HTTP identity and timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default = "default_referer")]
    pub referer: String,

    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            origin: default_origin(),
            referer: default_referer(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Wildberries endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct WildberriesConfig {
    /// Product card endpoint; the article id is appended verbatim
    #[serde(rename = "detail-endpoint", default = "default_detail_endpoint")]
    pub detail_endpoint: String,

    /// Image URL template with `{shard}`, `{vol}`, `{part}`, `{article}` and `{ext}`
    #[serde(rename = "image-template", default = "default_image_template")]
    pub image_template: String,

    #[serde(rename = "image-extension", default = "default_image_extension")]
    pub image_extension: String,

    /// Highest basket shard number to probe
    #[serde(rename = "max-shards", default = "default_max_shards")]
    pub max_shards: u8,
}

impl Default for WildberriesConfig {
    fn default() -> Self {
        Self {
            detail_endpoint: default_detail_endpoint(),
            image_template: default_image_template(),
            image_extension: default_image_extension(),
            max_shards: default_max_shards(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_marketplace() -> Marketplace {
    Marketplace::Wildberries
}

fn default_max_concurrent_fetches() -> u32 {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_period() -> f64 {
    60.0
}

fn default_limit() -> u32 {
    300
}

fn default_interval() -> f64 {
    1.0
}

fn default_burst() -> u32 {
    10
}

fn default_penalized_status() -> u16 {
    409
}

fn default_penalty_weight() -> u32 {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36"
        .to_string()
}

fn default_origin() -> String {
    "https://www.wildberries.ru".to_string()
}

fn default_referer() -> String {
    "https://www.wildberries.ru/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_detail_endpoint() -> String {
    "https://card.wb.ru/cards/v4/detail?appType=1&curr=rub&dest=1259570207&spp=30\
     &hide_vflags=4294967296&hide_dtype=9%3B11&ab_testing=false&lang=ru&nm="
        .to_string()
}

fn default_image_template() -> String {
    "https://basket-{shard}.wbbasket.ru/vol{vol}/part{part}/{article}/images/big/1.{ext}"
        .to_string()
}

fn default_image_extension() -> String {
    "webp".to_string()
}

fn default_max_shards() -> u8 {
    99
}
