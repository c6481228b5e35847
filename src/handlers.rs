// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP surface of the edge window limiter.
//!
//! The limiter runs as axum middleware in front of every route except a
//! static-asset exemption list. Admitted requests continue downstream and
//! their responses gain advisory `X-RateLimit-*` headers; rejected requests
//! short-circuit with `429 Too Many Requests`, a `Retry-After` header and a
//! machine-readable JSON body.

use crate::identity::client_identifier;
use crate::limiter::{RateLimitOutcome, WindowLimiter};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Path prefixes never counted against the limit.
const EXEMPT_PREFIXES: &[&str] = &["/assets", "/static", "/favicon"];
/// File extensions never counted against the limit.
const EXEMPT_EXTENSIONS: &[&str] = &["ico", "png", "jpg", "jpeg", "svg", "gif", "webp"];

/// Shared application state.
pub struct AppState {
    pub limiter: WindowLimiter,
}

/// Rejection payload sent with a 429.
#[derive(Debug, Serialize)]
pub struct RateLimitExceeded {
    pub error: &'static str,
    pub message: String,
    #[serde(rename = "retryAfter")]
    pub retry_after: u64,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the router with the rate limit middleware applied.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(upstream_placeholder)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "dashboard-rate-limiter",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Stand-in for the upstream application. In a deployment where the limiter
/// fronts the API directly, admitted requests would be forwarded here.
async fn upstream_placeholder() -> &'static str {
    "ok"
}

/// Admission middleware. Evaluated once per inbound request.
pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    if is_exempt(req.uri().path()) {
        return next.run(req).await;
    }

    let identifier = client_identifier(req.headers());

    match state.limiter.check(&identifier).await {
        RateLimitOutcome::Admitted {
            remaining,
            reset_at_ms,
        } => {
            debug!(identifier = %identifier, remaining, "Request admitted");
            let mut response = next.run(req).await;
            apply_limit_headers(
                response.headers_mut(),
                state.limiter.limit(),
                remaining,
                reset_at_ms,
            );
            response
        }
        RateLimitOutcome::Rejected {
            retry_after,
            reset_at_ms,
        } => {
            let retry_secs = ceil_secs(retry_after);
            info!(
                identifier = %identifier,
                retry_after_secs = retry_secs,
                "Request rate limited"
            );

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(RateLimitExceeded {
                    error: "Too Many Requests",
                    message: "Rate limit exceeded. Please try again later.".to_string(),
                    retry_after: retry_secs,
                }),
            )
                .into_response();
            apply_limit_headers(response.headers_mut(), state.limiter.limit(), 0, reset_at_ms);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
            response
        }
    }
}

/// Whether a path bypasses rate limiting entirely.
fn is_exempt(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p))
        || path
            .rsplit_once('.')
            .is_some_and(|(_, ext)| EXEMPT_EXTENSIONS.contains(&ext))
}

/// Set the advisory headers carried on every non-exempt response.
fn apply_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at_ms: u64) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    // Reset time advertised in epoch seconds, rounded up.
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(reset_at_ms.div_ceil(1000)),
    );
}

/// Round a duration up to whole seconds.
fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
