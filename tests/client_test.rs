// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests for the governed client against a live listener.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use dashboard_rate_limiter::client::{ApiClient, ClientError};
use dashboard_rate_limiter::config::{GovernorConfig, RateLimitConfig};
use dashboard_rate_limiter::handlers::{app, AppState};
use dashboard_rate_limiter::limiter::WindowLimiter;
use std::sync::Arc;
use tokio::net::TcpListener;

fn fast_governor() -> GovernorConfig {
    GovernorConfig {
        min_interval_ms: 0,
        max_concurrent: 5,
    }
}

/// Serve a router on an ephemeral port, returning its base URL.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_unauthorized_maps_to_typed_error() {
    let router = Router::new().route("/private", get(|| async { StatusCode::UNAUTHORIZED }));
    let base = serve(router).await;
    let client = ApiClient::new(&base, fast_governor()).unwrap();

    match client.get("/private").await {
        Err(ClientError::Unauthorized) => {}
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_other_statuses_pass_through_untranslated() {
    let router = Router::new().route("/ok", get(|| async { "ok" }));
    let base = serve(router).await;
    let client = ApiClient::new(&base, fast_governor()).unwrap();

    let ok = client.get("/ok").await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(ok.text().await.unwrap(), "ok");

    // Only 401 and 429 are translated; a 404 comes back as a response.
    let missing = client.get("/nope").await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edge_rejection_maps_to_rate_limited() {
    // Run the client against the real edge gate with a one-request window.
    let limiter = WindowLimiter::new(RateLimitConfig {
        max_requests: 1,
        window_ms: 60_000,
        ..Default::default()
    });
    let base = serve(app(Arc::new(AppState { limiter }))).await;
    let client = ApiClient::new(&base, fast_governor()).unwrap();

    let admitted = client.get("/api/posts").await.unwrap();
    assert_eq!(admitted.status(), StatusCode::OK);

    match client.get("/api/posts").await {
        Err(ClientError::RateLimited {
            message,
            retry_after,
        }) => {
            let secs = retry_after.expect("Retry-After hint should be present");
            assert!((1..=60).contains(&secs));
            assert!(message.contains(&format!("{secs} seconds")));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}
