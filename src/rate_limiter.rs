//! Fixed-window request counter per identifier.
//!
//! Each identifier owns a window that starts on its first counted request and
//! resets entirely once `window` has elapsed. A caller can therefore get up to
//! `2 * limit` requests through around a window boundary; this burst is
//! accepted rather than switching to a sliding window.

use crate::clock::{Clock, system_clock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitCounter {
    pub identifier: String,
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl RateLimitCounter {
    fn window_elapsed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        now.signed_duration_since(self.window_start) >= window
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    clock: Arc<dyn Clock>,
    counters: Arc<Mutex<HashMap<String, RateLimitCounter>>>,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self::with_clock(limit, system_clock())
    }

    pub fn with_clock(limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            clock,
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Counts one request for `identifier` and reports whether it is allowed.
    ///
    /// A rejected request does not increment the counter.
    pub async fn check_and_increment(&self, identifier: &str, window: Duration) -> bool {
        let now = self.clock.now();
        let mut counters = self.counters.lock().await;

        let counter = counters
            .entry(identifier.to_string())
            .or_insert_with(|| RateLimitCounter {
                identifier: identifier.to_string(),
                count: 0,
                window_start: now,
            });

        if counter.window_elapsed(now, window) {
            counter.count = 0;
            counter.window_start = now;
        }

        if counter.count == 0 {
            // Window (re)starts with the first counted request
            counter.window_start = now;
        }

        if counter.count < self.limit {
            counter.count += 1;
            true
        } else {
            false
        }
    }

    /// Forgets the identifier; its next request opens a fresh window.
    pub async fn reset(&self, identifier: &str) {
        let mut counters = self.counters.lock().await;
        counters.remove(identifier);
    }

    /// Requests still allowed in the identifier's current window.
    pub async fn remaining(&self, identifier: &str, window: Duration) -> u32 {
        let now = self.clock.now();
        let counters = self.counters.lock().await;

        match counters.get(identifier) {
            Some(counter) if !counter.window_elapsed(now, window) => {
                self.limit.saturating_sub(counter.count)
            }
            _ => self.limit,
        }
    }

    /// Drops counters whose window has elapsed and returns how many were removed.
    ///
    /// A pruned identifier behaves exactly like one that was never seen.
    pub async fn prune(&self, window: Duration) -> usize {
        let now = self.clock.now();
        let mut counters = self.counters.lock().await;
        let before = counters.len();
        counters.retain(|_, counter| !counter.window_elapsed(now, window));
        let removed = before.saturating_sub(counters.len());

        if removed > 0 {
            debug!("Rate limiter cleanup: dropped {} idle identifiers", removed);
        }
        removed
    }

    pub async fn counter(&self, identifier: &str) -> Option<RateLimitCounter> {
        let counters = self.counters.lock().await;
        counters.get(identifier).cloned()
    }

    pub async fn tracked_identifiers(&self) -> usize {
        self.counters.lock().await.len()
    }
}
