// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-email throttle on failed TOTP verifications.
//!
//! Counters live in process memory; each instance throttles independently.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    failures: u32,
    started_at: Instant,
}

/// Fixed-window attempt counter keyed by email.
///
/// Every attempt is registered as a failure up front and only forgiven by
/// `reset` (success) or `release` (no code was checked), so concurrent
/// requests cannot slip past the limit while a store read is in flight.
#[derive(Clone)]
pub struct AttemptLimiter {
    windows: Arc<DashMap<String, FailureWindow>>,
    max_failures: u32,
    window: Duration,
}

impl AttemptLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_failures,
            window,
        }
    }

    /// Register one attempt for `key`, or `Err(remaining)` while locked out.
    pub fn reserve(&self, key: &str) -> Result<(), Duration> {
        self.reserve_at(key, Instant::now())
    }

    /// Give back an attempt that never reached the code check.
    pub fn release(&self, key: &str) {
        if let Some(mut entry) = self.windows.get_mut(key) {
            entry.failures = entry.failures.saturating_sub(1);
        }
    }

    /// Forget all failures for `key`.
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    fn reserve_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        // Check and increment under one shard lock.
        let mut entry = self.windows.entry(key.to_string()).or_insert(FailureWindow {
            failures: 0,
            started_at: now,
        });

        let elapsed = now.saturating_duration_since(entry.started_at);
        if elapsed >= self.window {
            *entry = FailureWindow {
                failures: 0,
                started_at: now,
            };
        } else if entry.failures >= self.max_failures {
            return Err(self.window - elapsed);
        }

        entry.failures += 1;
        Ok(())
    }
}
