//! HTTP plumbing shared by the scrapers
//!
//! This module handles:
//! - Building the HTTP client with browser-like default headers
//! - Bounding response bodies quoted in error messages

use crate::config::HttpConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::Client;
use std::time::Duration;

/// Maximum number of characters of a response body quoted in an error
pub const SNIPPET_LIMIT: usize = 200;

/// Builds an HTTP client with proper configuration
///
/// The marketplace APIs reject requests that do not look like they come from
/// the storefront, so the configured origin and referer are sent with every
/// request.
///
/// # Arguments
///
/// * `config` - The HTTP identity and timeout configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use pricelens::config::HttpConfig;
/// use pricelens::scraper::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    if let Ok(origin) = HeaderValue::from_str(&config.origin) {
        headers.insert(ORIGIN, origin);
    }
    if let Ok(referer) = HeaderValue::from_str(&config.referer) {
        headers.insert(REFERER, referer);
    }
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Flattens a response body into a single bounded line for error messages
pub fn response_snippet(body: &str) -> String {
    let flattened: String = body
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let trimmed = flattened.trim();

    match trimmed.char_indices().nth(SNIPPET_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
