// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-window rate limiter for the API edge.
//!
//! Counts requests per client identifier against a fixed window: the counter
//! resets at a fixed boundary rather than sliding continuously. The record
//! store is in-memory and per-process; when the service runs as multiple
//! instances each enforces the limit independently, so the effective global
//! limit is `max_requests x instance_count`. That is an accepted limitation,
//! not a feature.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Result of an admission check.
#[derive(Debug, Clone)]
pub enum RateLimitOutcome {
    /// Request is admitted
    Admitted {
        /// Remaining requests in the current window
        remaining: u32,
        /// Absolute window reset time, epoch milliseconds
        reset_at_ms: u64,
    },
    /// Request is rejected, window exhausted
    Rejected {
        /// Time until the window resets
        retry_after: Duration,
        /// Absolute window reset time, epoch milliseconds
        reset_at_ms: u64,
    },
}

/// Per-identifier window record.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    /// Requests observed in the current window
    count: u32,
    /// When the window resets, epoch milliseconds
    reset_at_ms: u64,
}

/// Thread-safe fixed-window limiter.
pub struct WindowLimiter {
    config: RateLimitConfig,
    records: Arc<RwLock<HashMap<String, WindowRecord>>>,
}

impl WindowLimiter {
    /// Create a new limiter with the given configuration.
    pub fn new(mut config: RateLimitConfig) -> Self {
        // A zero ceiling would underflow the remaining count on every fresh
        // window.
        config.max_requests = config.max_requests.max(1);
        Self {
            config,
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The configured per-window request ceiling.
    pub fn limit(&self) -> u32 {
        self.config.max_requests
    }

    /// Check and count a request for the given client identifier.
    pub async fn check(&self, identifier: &str) -> RateLimitOutcome {
        self.check_at(identifier, epoch_ms()).await
    }

    /// Check against an explicit clock reading. All mutation happens here.
    async fn check_at(&self, identifier: &str, now_ms: u64) -> RateLimitOutcome {
        trace!(identifier, "Checking rate limit");

        let mut records = self.records.write().await;

        // Live window: reject once exhausted, count otherwise.
        if let Some(record) = records.get_mut(identifier) {
            if now_ms <= record.reset_at_ms {
                if record.count >= self.config.max_requests {
                    let reset_at_ms = record.reset_at_ms;
                    debug!(
                        identifier,
                        count = record.count,
                        reset_at_ms,
                        "Rate limit exceeded"
                    );
                    return RateLimitOutcome::Rejected {
                        retry_after: Duration::from_millis(reset_at_ms - now_ms),
                        reset_at_ms,
                    };
                }

                record.count += 1;
                return RateLimitOutcome::Admitted {
                    remaining: self.config.max_requests - record.count,
                    reset_at_ms: record.reset_at_ms,
                };
            }
        }

        // Absent or expired: open a fresh window with this request already
        // counted.
        let record = WindowRecord {
            count: 1,
            reset_at_ms: now_ms + self.config.window_ms,
        };
        records.insert(identifier.to_string(), record);

        // Inline sweep bounds memory growth from identifier churn.
        // O(size) on the request path, accepted tradeoff.
        if records.len() > self.config.sweep_threshold {
            let before = records.len();
            records.retain(|_, r| now_ms <= r.reset_at_ms);
            debug!(
                swept = before - records.len(),
                remaining = records.len(),
                "Swept expired rate limit records"
            );
        }

        RateLimitOutcome::Admitted {
            remaining: self.config.max_requests - 1,
            reset_at_ms: record.reset_at_ms,
        }
    }

    /// Number of tracked identifiers. Primarily useful for tests.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Current wall-clock time as epoch milliseconds.
fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
