//! # Torwache Gateway Library
//!
//! Torwache is a request admission and threat-control gateway: a stateful
//! pipeline in front of every inbound HTTP request that authenticates
//! callers, throttles abusive traffic, detects reconnaissance probes and
//! keeps an audit trail - all in process-local memory, no external datastore.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: Web framework for HTTP server, routing and middleware
//! - **Tokio**: Async runtime for concurrent request handling
//! - **Tracing**: Structured logging with file rotation
//! - **Serde**: Serialization/deserialization for JSON APIs
//!
//! ## Core Components
//!
//! - [`app`]: Router and pipeline composition
//! - [`backend`]: Boundary to the external chat collaborator
//! - [`config`]: Layered configuration management
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`metrics`]: Security counters
//! - [`middleware`]: Pipeline stages - identity, gate, rate limit, auth,
//!   body-size guard, response hardener
//! - [`routes`]: HTTP endpoint handlers
//! - [`security`]: Violation ledger, audit log, input sanitizer
//! - [`state`]: Shared application state
//! - [`types`]: Data transfer objects

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
