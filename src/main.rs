// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! Edge rate limiter service.
//!
//! Serves the fixed-window admission gate in front of the dashboard API.
//! All non-static requests are counted per client identifier; exhausted
//! clients receive `429 Too Many Requests` with a `Retry-After` hint.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
//! - `RATE_LIMIT_MAX`: max requests per window per identifier (default: 60)
//! - `RATE_LIMIT_WINDOW_MS`: window duration in milliseconds (default: 60000)
//! - `SWEEP_THRESHOLD`: store size that triggers the expired-record sweep
//!   (default: 10000)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dashboard_rate_limiter::{
    config::Config,
    handlers::{app, AppState},
    limiter::WindowLimiter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_ms = config.rate_limit.window_ms,
        sweep_threshold = config.rate_limit.sweep_threshold,
        "Starting edge rate limiter"
    );

    // Create application state
    let limiter = WindowLimiter::new(config.rate_limit.clone());
    let state = Arc::new(AppState { limiter });

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        rate_limit: dashboard_rate_limiter::config::RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            window_ms: std::env::var("RATE_LIMIT_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),
            sweep_threshold: std::env::var("SWEEP_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        },
        ..Default::default()
    }
}
