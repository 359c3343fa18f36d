//! Router-level tests for the admission pipeline.
//!
//! - **api_tests**: end-to-end pipeline behavior through `oneshot` requests
//! - **config_tests**: configuration defaults, precedence and validation

pub mod api_tests;
