//! Request admission control
//!
//! This module contains the dual sliding-window rate limiter that gates every
//! outbound marketplace request:
//! - Weighted admissions checked against a period and a burst window
//! - Analytical wait computation instead of fixed-tick polling
//! - Retroactive penalties for throttled responses

mod rate_limiter;
mod window;

pub use rate_limiter::{LimiterSnapshot, RateLimiter};
pub use window::{RateWindow, WindowEvent};

use thiserror::Error;

/// Errors raised by the rate limiter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterError {
    #[error("Weight {weight} can never be admitted (limit {limit}, burst {burst})")]
    WeightExceedsCapacity { weight: u32, limit: u32, burst: u32 },
}
