use axum::{extract::State, http::HeaderMap, Json};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{keys_match, INTERNAL_KEY_HEADER};
use crate::middleware::ip::{extract_ip_from_headers, MaybeRemoteAddr};
use crate::state::AppState;
use crate::types::{SecurityStats, TopViolator};

/// `GET /api/internal/security/stats` - internal diagnostics.
///
/// Guarded by a secret separate from the public API key. Without a configured
/// internal key the route is unreachable by design.
pub async fn security_stats(
    State(state): State<AppState>,
    MaybeRemoteAddr(addr): MaybeRemoteAddr,
    headers: HeaderMap,
) -> AppResult<Json<SecurityStats>> {
    let ip = extract_ip_from_headers(&headers, addr.map(|a| a.ip()));

    let Some(expected) = state.config.security.internal_api_key.as_deref().filter(|k| !k.is_empty())
    else {
        return Err(AppError::InvalidKey);
    };

    match headers.get(INTERNAL_KEY_HEADER).and_then(|h| h.to_str().ok()) {
        None => {
            state.metrics.inc_auth_failures();
            state.record_violation(ip, "Missing internal key");
            return Err(AppError::MissingKey);
        }
        Some(provided) if keys_match(provided, expected) => {}
        Some(_) => {
            state.metrics.inc_auth_failures();
            state.record_violation(ip, "Invalid internal key");
            return Err(AppError::InvalidKey);
        }
    }

    let top_violators = state
        .ledger
        .top_violators(10)
        .into_iter()
        .map(|(ip, violations)| TopViolator { ip, violations })
        .collect();

    Ok(Json(SecurityStats {
        blocked_ips: state.ledger.blocked_count(),
        total_violations: state.ledger.total_violations(),
        recent_events: state.audit.recent(50),
        top_violators,
        metrics: state.metrics.get_snapshot(),
    }))
}
