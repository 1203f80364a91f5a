//! Fixed-window rate limiting.
//!
//! Counts attempts per key in discrete windows that reset wholesale. State is an
//! in-process `DashMap`: a restart clears every limit and separate processes do not
//! share budgets, so this throttles UX rather than enforcing a security boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::config::{LimiterSettings, RateLimitSettings};
use crate::shared::clock::{system_clock, Clock};

/// Expired entries are swept once every this many `is_allowed` calls.
pub const PRUNE_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_reset_at: DateTime<Utc>,
}

/// Snapshot of a key's budget, used for response headers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum attempts allowed per window
    pub limit: u32,
    /// Attempts left in the current window
    pub remaining: u32,
    /// Unix timestamp (seconds) when the current window resets
    pub reset_at: i64,
    /// Seconds until the window resets
    pub retry_after: u64,
}

/// Per-key fixed-window attempt counter.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, RateLimitEntry>>,
    calls: Arc<AtomicU64>,
    max_attempts: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self::with_clock(max_attempts, window, system_clock())
    }

    pub fn with_clock(max_attempts: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            calls: Arc::new(AtomicU64::new(0)),
            max_attempts,
            window,
            clock,
        }
    }

    pub fn from_settings(settings: &LimiterSettings, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(
            settings.max_attempts,
            Duration::milliseconds(settings.window_ms as i64),
            clock,
        )
    }

    /// Record an attempt for `key` and report whether it may proceed.
    ///
    /// A key whose window has passed starts over at count 1. Denied attempts do not
    /// touch the counter.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();
        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % PRUNE_INTERVAL == 0 {
            self.prune_expired();
        }

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_reset_at: now + self.window,
            });

        if entry.count == 0 || now > entry.window_reset_at {
            *entry = RateLimitEntry {
                count: 1,
                window_reset_at: now + self.window,
            };
            return true;
        }

        if entry.count >= self.max_attempts {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Whole seconds until the key's window resets, 0 if the key is unknown.
    pub fn remaining_time(&self, key: &str) -> u64 {
        let Some(entry) = self.entries.get(key).map(|e| *e) else {
            return 0;
        };
        let remaining_ms = (entry.window_reset_at - self.clock.now()).num_milliseconds();
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms as u64).div_ceil(1000)
        }
    }

    /// Drop every entry whose window has passed. Such entries already count as absent.
    pub fn prune_expired(&self) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| now <= entry.window_reset_at);
    }

    /// Number of tracked keys, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget `key`, allowing it again immediately.
    pub fn reset(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Budget for `key` without consuming an attempt.
    pub fn status(&self, key: &str) -> RateLimitInfo {
        let now = self.clock.now();
        let live = self
            .entries
            .get(key)
            .map(|e| *e)
            .filter(|entry| now <= entry.window_reset_at);

        match live {
            Some(entry) => RateLimitInfo {
                limit: self.max_attempts,
                remaining: self.max_attempts.saturating_sub(entry.count),
                reset_at: entry.window_reset_at.timestamp(),
                retry_after: self.remaining_time(key),
            },
            None => RateLimitInfo {
                limit: self.max_attempts,
                remaining: self.max_attempts,
                reset_at: (now + self.window).timestamp(),
                retry_after: 0,
            },
        }
    }

    /// Current attempt count in a live window.
    pub fn attempts(&self, key: &str) -> u32 {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| now <= entry.window_reset_at)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// The three independent budgets the console uses.
#[derive(Clone)]
pub struct RateLimiters {
    pub login: RateLimiter,
    pub search: RateLimiter,
    pub api: RateLimiter,
}

impl RateLimiters {
    pub fn from_settings(settings: &RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            login: RateLimiter::from_settings(&settings.login, clock.clone()),
            search: RateLimiter::from_settings(&settings.search, clock.clone()),
            api: RateLimiter::from_settings(&settings.api, clock),
        }
    }
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::from_settings(&RateLimitSettings::default(), system_clock())
    }
}
