use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::ip::client_ip;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the pre-shared secret for protected routes.
pub const API_KEY_HEADER: &str = "x-torwache-api-key";
/// Separate secret for the internal diagnostics route.
pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// Timing-safe comparison of a provided key against the configured secret.
///
/// Both sides are hashed to a fixed-width digest first, then compared with
/// `subtle::ConstantTimeEq`. Hashing removes any length relationship between
/// the inputs and the comparison, so a wrong-length key takes the same time
/// as a key differing only in its last character.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.as_slice().ct_eq(expected.as_slice()).into()
}

/// Middleware enforcing the API key on protected routes.
///
/// When `security.require_api_key` is false this is a no-op - the documented
/// development escape hatch. A missing header and a mismatched key are both
/// 401s with distinct codes, and both count as violations.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let sec = &state.config.security;
    if !sec.require_api_key {
        return next.run(req).await;
    }
    // Guaranteed set by config validation when require_api_key is true
    let Some(expected) = sec.api_key.as_deref() else {
        return AppError::Internal(anyhow::anyhow!("require_api_key set without api_key")).into_response();
    };

    let ip = client_ip(&req);
    match req.headers().get(API_KEY_HEADER).and_then(|h| h.to_str().ok()) {
        None => {
            state.metrics.inc_auth_failures();
            state.record_violation(ip, "Missing API key");
            AppError::MissingKey.into_response()
        }
        Some(provided) if keys_match(provided, expected) => next.run(req).await,
        Some(_) => {
            state.metrics.inc_auth_failures();
            state.record_violation(ip, "Invalid API key");
            AppError::InvalidKey.into_response()
        }
    }
}
