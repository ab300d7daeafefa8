use crate::config::types::{
    Config, HttpConfig, OutputConfig, RateLimitConfig, ScraperConfig, WildberriesConfig,
};
use crate::ConfigError;
use url::Url;

/// Longest limiter window accepted, in seconds (one day)
const MAX_WINDOW_SECS: f64 = 86_400.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_http_config(&config.http)?;
    validate_wildberries_config(&config.wildberries)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 64, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates the limiter budget
///
/// A burst ceiling above the period limit could never be used, and a burst
/// window longer than the period would make the two windows swap roles.
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if !(config.period.is_finite() && config.period > 0.0 && config.period <= MAX_WINDOW_SECS) {
        return Err(ConfigError::Validation(format!(
            "period must be between 0 and {} seconds, got {}",
            MAX_WINDOW_SECS, config.period
        )));
    }

    if !(config.interval.is_finite()
        && config.interval > 0.0
        && config.interval <= MAX_WINDOW_SECS)
    {
        return Err(ConfigError::Validation(format!(
            "interval must be between 0 and {} seconds, got {}",
            MAX_WINDOW_SECS, config.interval
        )));
    }

    if config.interval > config.period {
        return Err(ConfigError::Validation(format!(
            "interval ({}s) must not exceed period ({}s)",
            config.interval, config.period
        )));
    }

    if config.limit < 1 {
        return Err(ConfigError::Validation(format!(
            "limit must be >= 1, got {}",
            config.limit
        )));
    }

    if config.burst < 1 || config.burst > config.limit {
        return Err(ConfigError::Validation(format!(
            "burst must be between 1 and limit ({}), got {}",
            config.limit, config.burst
        )));
    }

    if !(100..=599).contains(&config.penalized_status) {
        return Err(ConfigError::Validation(format!(
            "penalized_status must be an HTTP status code, got {}",
            config.penalized_status
        )));
    }

    if config.penalty_weight < 1 {
        return Err(ConfigError::Validation(format!(
            "penalty_weight must be >= 1, got {}",
            config.penalty_weight
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    Ok(())
}

fn validate_wildberries_config(config: &WildberriesConfig) -> Result<(), ConfigError> {
    validate_http_url("detail_endpoint", &config.detail_endpoint)?;

    for placeholder in ["{shard}", "{article}"] {
        if !config.image_template.contains(placeholder) {
            return Err(ConfigError::InvalidTemplate(format!(
                "image_template must contain {}, got '{}'",
                placeholder, config.image_template
            )));
        }
    }

    if config.image_extension.is_empty()
        || !config.image_extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::Validation(format!(
            "image_extension must be a plain file extension, got '{}'",
            config.image_extension
        )));
    }

    if config.max_shards < 1 || config.max_shards > 99 {
        return Err(ConfigError::Validation(format!(
            "max_shards must be between 1 and 99, got {}",
            config.max_shards
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a configured endpoint is an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate_limit_is_valid() {
        assert!(validate_rate_limit_config(&RateLimitConfig::default()).is_ok());
    }

    #[test]
    fn test_rate_limit_rejects_burst_above_limit() {
        let config = RateLimitConfig {
            limit: 5,
            burst: 6,
            ..RateLimitConfig::default()
        };
        assert!(validate_rate_limit_config(&config).is_err());
    }

    #[test]
    fn test_rate_limit_rejects_interval_longer_than_period() {
        let config = RateLimitConfig {
            period: 1.0,
            interval: 2.0,
            ..RateLimitConfig::default()
        };
        assert!(validate_rate_limit_config(&config).is_err());
    }

    #[test]
    fn test_rate_limit_rejects_non_positive_windows() {
        let config = RateLimitConfig {
            period: 0.0,
            ..RateLimitConfig::default()
        };
        assert!(validate_rate_limit_config(&config).is_err());

        let config = RateLimitConfig {
            interval: f64::NAN,
            ..RateLimitConfig::default()
        };
        assert!(validate_rate_limit_config(&config).is_err());
    }

    #[test]
    fn test_rate_limit_rejects_windows_longer_than_a_day() {
        let config = RateLimitConfig {
            period: MAX_WINDOW_SECS + 1.0,
            ..RateLimitConfig::default()
        };
        assert!(validate_rate_limit_config(&config).is_err());

        let config = RateLimitConfig {
            period: MAX_WINDOW_SECS,
            interval: MAX_WINDOW_SECS,
            ..RateLimitConfig::default()
        };
        assert!(validate_rate_limit_config(&config).is_ok());
    }

    #[test]
    fn test_huge_period_rejected_when_parsing() {
        let result = crate::config::parse_config(
            "[rate-limit]\nperiod = 1e20\ninterval = 1.0\n[output]\ndatabase-path = \"x.db\"\n",
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rate_limit_rejects_bogus_status() {
        let config = RateLimitConfig {
            penalized_status: 42,
            ..RateLimitConfig::default()
        };
        assert!(validate_rate_limit_config(&config).is_err());
    }

    #[test]
    fn test_template_requires_placeholders() {
        let config = WildberriesConfig {
            image_template: "https://basket.example.com/{vol}/1.webp".to_string(),
            ..WildberriesConfig::default()
        };
        assert!(matches!(
            validate_wildberries_config(&config),
            Err(ConfigError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_max_shards_bounds() {
        let config = WildberriesConfig {
            max_shards: 0,
            ..WildberriesConfig::default()
        };
        assert!(validate_wildberries_config(&config).is_err());

        let config = WildberriesConfig {
            max_shards: 100,
            ..WildberriesConfig::default()
        };
        assert!(validate_wildberries_config(&config).is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("endpoint", "https://card.wb.ru/detail?nm=").is_ok());
        assert!(validate_http_url("endpoint", "http://127.0.0.1:8080/detail?nm=").is_ok());

        assert!(validate_http_url("endpoint", "").is_err());
        assert!(validate_http_url("endpoint", "ftp://card.wb.ru/").is_err());
        assert!(validate_http_url("endpoint", "not a url").is_err());
    }
}
