//! Dual-window weighted rate limiter
//!
//! Every request a scraper sends is admitted here first. Two windows apply at
//! once: the period window bounds sustained throughput and the interval
//! window bounds bursts. Callers that learn a request was throttled report it
//! through [`RateLimiter::record_response`], which charges the difference
//! between the penalty weight and what was reserved.

use crate::config::RateLimitConfig;
use crate::limiter::window::RateWindow;
use crate::limiter::LimiterError;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shortest sleep between admission attempts
const MIN_WAIT: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Windows {
    period: RateWindow,
    interval: RateWindow,
}

impl Windows {
    fn expire(&mut self, now: Instant) {
        self.period.expire(now);
        self.interval.expire(now);
    }

    fn push(&mut self, now: Instant, weight: u32) {
        self.period.push(now, weight);
        self.interval.push(now, weight);
    }
}

/// Point-in-time view of both windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSnapshot {
    pub period_total: u32,
    pub period_events: usize,
    pub interval_total: u32,
    pub interval_events: usize,
}

/// Adaptive admission gate shared by every request of one scraper
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<Windows>,
    limit: u32,
    burst: u32,
    penalized_status: u16,
    penalty_weight: u32,
}

impl RateLimiter {
    /// Creates a limiter from the configured budget
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(Windows {
                period: RateWindow::new(config.period_duration(), config.limit),
                interval: RateWindow::new(config.interval_duration(), config.burst),
            }),
            limit: config.limit,
            burst: config.burst,
            penalized_status: config.penalized_status,
            penalty_weight: config.penalty_weight,
        }
    }

    /// Waits until both windows accept `weight`, then records it
    ///
    /// The wait is recomputed from the window contents on every attempt, so
    /// waiters are not served in arrival order: whoever wakes up and finds
    /// room first is admitted. Nothing is recorded until admission, which
    /// makes dropping the returned future harmless.
    ///
    /// # Errors
    ///
    /// * `LimiterError::WeightExceedsCapacity` - `weight` is larger than the
    ///   period limit or the burst ceiling and could never be admitted
    pub async fn acquire(&self, weight: u32) -> Result<(), LimiterError> {
        if weight > self.limit || weight > self.burst {
            return Err(LimiterError::WeightExceedsCapacity {
                weight,
                limit: self.limit,
                burst: self.burst,
            });
        }

        if weight == 0 {
            return Ok(());
        }

        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let now = Instant::now();
                windows.expire(now);

                if windows.period.has_room(weight) && windows.interval.has_room(weight) {
                    windows.push(now, weight);
                    return Ok(());
                }

                let period_wait = windows.period.time_until_room(now, weight);
                let interval_wait = windows.interval.time_until_room(now, weight);
                period_wait.max(interval_wait).max(MIN_WAIT)
            };

            tracing::trace!("Rate limit reached, waiting {:?} for weight {}", wait, weight);
            tokio::time::sleep(wait).await;
        }
    }

    /// Charges the extra cost of a throttled response
    ///
    /// When `status` is the penalized status the request really cost
    /// `penalty_weight`; the part not covered by `reserved_weight` is appended
    /// to both windows at the current instant. Any other status is free.
    pub async fn record_response(&self, status: u16, reserved_weight: u32) {
        let extra = self
            .weight_for_status(status)
            .saturating_sub(reserved_weight);
        if extra == 0 {
            return;
        }

        tracing::debug!(
            "Status {} penalized, charging {} extra weight",
            status,
            extra
        );

        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        windows.expire(now);
        windows.push(now, extra);
    }

    /// Cost of a request that came back with `status`
    pub fn weight_for_status(&self, status: u16) -> u32 {
        if status == self.penalized_status {
            self.penalty_weight
        } else {
            1
        }
    }

    /// Returns the window totals after expiring stale events
    pub async fn snapshot(&self) -> LimiterSnapshot {
        let mut windows = self.windows.lock().await;
        windows.expire(Instant::now());
        LimiterSnapshot {
            period_total: windows.period.total(),
            period_events: windows.period.len(),
            interval_total: windows.interval.total(),
            interval_events: windows.interval.len(),
        }
    }
}
