// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! Dashboard Rate Limiter
//!
//! This crate provides the two rate-limiting layers used by the dashboard
//! application, one on each side of the wire:
//!
//! - An **edge window limiter**: a fixed-window request-admission gate keyed
//!   by client identifier, enforced as axum middleware in front of the API.
//!   Every response carries advisory `X-RateLimit-*` headers; exhausted
//!   clients receive `429 Too Many Requests` with a `Retry-After` hint.
//! - A **client request governor**: an in-process FIFO queue that paces
//!   outbound calls (minimum inter-dispatch spacing) and bounds the number
//!   of simultaneously in-flight requests.
//!
//! The two components are policy-aligned but independent: the governor is
//! cooperative and can be bypassed, the edge limiter is authoritative.
//! [`client::ApiClient`] ties the client side together by routing every
//! request through the governor and translating edge rejections into a
//! typed, retry-hinting error.

pub mod client;
pub mod config;
pub mod governor;
pub mod handlers;
pub mod identity;
pub mod limiter;

pub use client::{ApiClient, ClientError};
pub use config::Config;
pub use governor::{GovernorError, RequestGovernor};
pub use limiter::{RateLimitOutcome, WindowLimiter};
