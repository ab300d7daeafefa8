//! A single sliding window of weighted admissions

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// One admitted unit of work and its cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEvent {
    pub at: Instant,
    pub weight: u32,
}

/// Sliding window bounding the total weight admitted within `length`
///
/// Events are appended in non-decreasing time order, so expiry only ever
/// removes from the front. `total` always equals the sum of the weights still
/// held once `expire` has run for the current instant.
#[derive(Debug)]
pub struct RateWindow {
    length: Duration,
    threshold: u32,
    events: VecDeque<WindowEvent>,
    total: u32,
}

impl RateWindow {
    pub fn new(length: Duration, threshold: u32) -> Self {
        Self {
            length,
            threshold,
            events: VecDeque::new(),
            total: 0,
        }
    }

    /// Drops every event that is at least one window length old
    pub fn expire(&mut self, now: Instant) {
        while let Some(front) = self.events.front() {
            if now.saturating_duration_since(front.at) < self.length {
                break;
            }
            self.total -= front.weight;
            self.events.pop_front();
        }
    }

    /// Whether `weight` more fits under the threshold right now
    pub fn has_room(&self, weight: u32) -> bool {
        self.total.saturating_add(weight) <= self.threshold
    }

    /// Earliest delay after which `weight` more would fit
    ///
    /// Walks the events oldest first until enough weight would have expired to
    /// cover the excess. Falls back to a full window length when even the
    /// newest event does not free enough room.
    pub fn time_until_room(&self, now: Instant, weight: u32) -> Duration {
        if self.has_room(weight) {
            return Duration::ZERO;
        }

        let excess = self.total.saturating_add(weight) - self.threshold;
        let mut freed = 0u32;
        for event in &self.events {
            freed = freed.saturating_add(event.weight);
            if freed >= excess {
                return (event.at + self.length).saturating_duration_since(now);
            }
        }

        self.length
    }

    pub fn push(&mut self, at: Instant, weight: u32) {
        self.events.push_back(WindowEvent { at, weight });
        self.total += weight;
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
