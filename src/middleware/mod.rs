//! Middleware components for the admission pipeline.
//!
//! Each stage is an Axum middleware with the uniform
//! `(request, next) -> response` contract, composed once at startup in
//! `main.rs`. Order matters: identity resolution feeds the blocklist gate,
//! which runs before the honeypot check, which runs before rate limiting;
//! the response hardener wraps everything as the outermost layer.

pub mod auth;
pub mod gate;
pub mod ip;
pub mod rate_limit;
pub mod security_headers;
pub mod validation;

pub use rate_limit::GatewayRateLimiter;
