// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! Governed HTTP client for the dashboard API.
//!
//! Every request flows through the [`RequestGovernor`] before it reaches the
//! network, and edge responses are translated into typed errors the caller
//! can act on: 429 becomes [`ClientError::RateLimited`] carrying the
//! retry-after hint, 401 becomes [`ClientError::Unauthorized`]. The client
//! never retries on its own; retry policy belongs to the caller.

use crate::config::GovernorConfig;
use crate::governor::{GovernorError, RequestGovernor};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remaining-budget level below which a warning is logged.
const REMAINING_WARN_THRESHOLD: u64 = 10;

/// Errors surfaced by the governed client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The edge rejected the request for the current window.
    #[error("{message}")]
    RateLimited {
        message: String,
        /// Seconds until the window resets, if the server said.
        retry_after: Option<u64>,
    },

    /// The edge rejected the request's credentials.
    #[error("authentication required")]
    Unauthorized,

    /// The request was discarded by [`ApiClient::clear`] before dispatch.
    #[error("request cancelled before dispatch")]
    Cleared,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status this error corresponds to, where one exists.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }
}

impl From<GovernorError> for ClientError {
    fn from(err: GovernorError) -> Self {
        match err {
            GovernorError::Cleared => Self::Cleared,
        }
    }
}

/// HTTP client wrapper routing every call through the request governor.
pub struct ApiClient {
    http: Client,
    governor: RequestGovernor,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: &str, governor: GovernorConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            governor: RequestGovernor::new(governor),
            base_url: Url::parse(base_url)?,
        })
    }

    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        let builder = self.http.get(self.base_url.join(path)?);
        self.dispatch(builder).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.http.post(self.base_url.join(path)?).json(body);
        self.dispatch(builder).await
    }

    pub async fn patch<B>(&self, path: &str, body: &B) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.http.patch(self.base_url.join(path)?).json(body);
        self.dispatch(builder).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        let builder = self.http.delete(self.base_url.join(path)?);
        self.dispatch(builder).await
    }

    /// Discard queued, not-yet-dispatched requests. Their callers observe
    /// [`ClientError::Cleared`]; in-flight requests complete normally.
    /// Intended for abrupt teardown such as navigation away.
    pub fn clear(&self) {
        self.governor.clear();
    }

    /// Run one request through the governor and translate the response.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = self
            .governor
            .execute(move || async move { builder.send().await })
            .await??;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(rate_limited(response.headers())),
            _ => {
                // Budget warning only accompanies responses handed back to
                // the caller; a 429 already tells the whole story.
                if let Some(remaining) = low_budget(response.headers()) {
                    let reset_epoch_secs = headers_u64(response.headers(), "x-ratelimit-reset");
                    warn!(remaining, reset_epoch_secs = ?reset_epoch_secs, "Rate limit budget running low");
                }
                Ok(response)
            }
        }
    }
}

/// Build the typed rate-limit error from a 429 response's headers.
fn rate_limited(headers: &HeaderMap) -> ClientError {
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let message = match retry_after {
        Some(secs) => format!("Rate limit exceeded. Please try again in {secs} seconds."),
        None => "Rate limit exceeded. Please try again later.".to_string(),
    };

    ClientError::RateLimited {
        message,
        retry_after,
    }
}

/// Advertised remaining budget, when it has dropped below the warning
/// threshold.
fn low_budget(headers: &HeaderMap) -> Option<u64> {
    headers_u64(headers, "x-ratelimit-remaining").filter(|r| *r < REMAINING_WARN_THRESHOLD)
}

fn headers_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_rate_limited_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));

        match rate_limited(&headers) {
            ClientError::RateLimited {
                message,
                retry_after,
            } => {
                assert_eq!(retry_after, Some(30));
                assert_eq!(message, "Rate limit exceeded. Please try again in 30 seconds.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rate_limited_without_retry_after() {
        let headers = HeaderMap::new();

        match rate_limited(&headers) {
            ClientError::RateLimited {
                message,
                retry_after,
            } => {
                assert_eq!(retry_after, None);
                assert_eq!(message, "Rate limit exceeded. Please try again later.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_low_budget_threshold() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("5"));
        assert_eq!(low_budget(&headers), Some(5));

        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("50"));
        assert_eq!(low_budget(&headers), None);

        assert_eq!(low_budget(&HeaderMap::new()), None);
    }

    #[test]
    fn test_error_status_mapping() {
        let rate_limited = ClientError::RateLimited {
            message: String::new(),
            retry_after: None,
        };
        assert_eq!(rate_limited.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(
            ClientError::Unauthorized.status(),
            Some(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(ClientError::Cleared.status(), None);
    }
}
