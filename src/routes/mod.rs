//! HTTP route handlers.
//!
//! Handlers here run only after a request has cleared the admission pipeline;
//! they validate and sanitize their own payloads and hand off to the external
//! collaborator boundary where one exists.
//!
//! - `info`: API info, health, model catalogue, platform status, 404 fallback
//! - `chat`: chat admission and backend handoff
//! - `balance`: address lookups (placeholder upstream)
//! - `security`: internal diagnostics, guarded by the internal key

pub mod balance;
pub mod chat;
pub mod info;
pub mod security;
