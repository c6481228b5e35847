// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! Client identifier derivation.
//!
//! Combines a best-effort client network address with a truncated client
//! signature (User-Agent). This is heuristic identity, not cryptographically
//! strong: distinct clients behind one proxy sharing a signature are treated
//! as one.

use axum::http::{header, HeaderMap};

/// How much of the client signature participates in the identifier.
const SIGNATURE_PREFIX_CHARS: usize = 50;

/// Derive the rate-limit identifier for a request.
///
/// The address is the first entry of `x-forwarded-for`, then `x-real-ip`,
/// then `cf-connecting-ip`, falling back to the literal `unknown`.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .or_else(|| headers.get("cf-connecting-ip").and_then(|v| v.to_str().ok()))
        .unwrap_or("unknown");

    let signature: String = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .chars()
        .take(SIGNATURE_PREFIX_CHARS)
        .collect();

    format!("{address}-{signature}")
}
