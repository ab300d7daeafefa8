//! Integration tests for PriceLens
//!
//! These tests use wiremock to stand in for the marketplace card API and
//! image CDN, and drive the real HTTP path end-to-end.

mod common;
mod image_tests;
mod scrape_tests;
