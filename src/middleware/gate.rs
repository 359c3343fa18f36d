use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::ip::client_ip;
use crate::error::AppError;
use crate::security::EventKind;
use crate::state::AppState;

/// Paths favored by automated scanners. Matched case-insensitively against
/// the request path, independent of whether a real route exists there.
const HONEYPOT_PATHS: &[&str] = &[
    "/admin",
    "/wp-admin",
    "/phpmyadmin",
    "/.env",
    "/config",
    "/backup",
    "/.git",
    "/api/admin",
    "/login",
    "/wp-login.php",
    "/administrator",
];

pub fn is_honeypot_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    HONEYPOT_PATHS.contains(&lower.as_str())
}

/// First stateful stage of the pipeline: blocklist gate, then honeypot
/// detection, then the per-request audit entry.
///
/// A blocked identity is rejected here and nothing downstream runs for it -
/// no rate limiting, no routing. A honeypot hit records a violation and
/// answers with a deliberately generic 401 that baits the scanner without
/// revealing real structure.
pub async fn security_checkpoint_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if state.ledger.is_blocked(ip) {
        state.audit.append(EventKind::BlockedRequest, ip, req.uri().path(), None);
        return AppError::IpBlocked.into_response();
    }

    let path = req.uri().path().to_string();
    if is_honeypot_path(&path) {
        state.metrics.inc_honeypot_hits();
        state.record_violation(ip, &format!("Honeypot triggered: {}", path));
        // Fake "interesting" response to waste the attacker's time
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Unauthorized",
                "hint": "Try /api/v2/admin with valid credentials",
            })),
        )
            .into_response();
    }

    state.metrics.inc_requests();
    state.audit.append(EventKind::Request, ip, &format!("{} {}", req.method(), path), None);

    next.run(req).await
}
