// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the rate limiting layers.
//!
//! Defaults match the reference policy: 60 requests per 60 second window at
//! the edge, 100 ms spacing and 5-way concurrency in the client governor.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Edge window limiter configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Client request governor configuration
    #[serde(default)]
    pub governor: GovernorConfig,
}

/// Edge window limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window per client identifier (default: 60)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window duration in milliseconds (default: 60000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Record store size above which expired records are swept inline
    /// (default: 10000)
    #[serde(default = "default_sweep_threshold")]
    pub sweep_threshold: usize,
}

/// Client request governor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Minimum spacing between dispatch starts in milliseconds (default: 100)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Maximum number of simultaneously in-flight tasks (default: 5)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    60
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_sweep_threshold() -> usize {
    10_000
}

fn default_min_interval_ms() -> u64 {
    100
}

fn default_max_concurrent() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            governor: GovernorConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            sweep_threshold: default_sweep_threshold(),
        }
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl RateLimitConfig {
    /// Get the window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl GovernorConfig {
    /// Get the minimum inter-dispatch spacing
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}
