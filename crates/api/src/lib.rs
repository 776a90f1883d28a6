//! HTTP API layer for campusdesk.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: Auth, complaints, votes, notifications, uploads, team,
//!   stats
//! - **Extractors**: Authentication and role checks
//! - **Middleware**: Bearer-token auth, rate limiting
//! - **Streaming**: Server-Sent Events for notification and branch feeds
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;
pub mod sse;

pub use endpoints::router;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};
pub use sse::{SseBroadcaster, SseEvent};
