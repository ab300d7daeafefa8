//! Configuration module for PriceLens
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pricelens::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pricelens.toml")).unwrap();
//! println!("Burst ceiling: {}", config.rate_limit.burst);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HttpConfig, OutputConfig, RateLimitConfig, ScraperConfig, WildberriesConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
