use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::AppError;
use crate::middleware::ip::{extract_ip_from_headers, MaybeRemoteAddr};
use crate::security::EventKind;
use crate::state::AppState;
use crate::types::ModelInfo;

// Root endpoint - API info
pub async fn root() -> impl IntoResponse {
    let body = json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "/": "This info",
            "/api/health": "Health check",
            "/api/chat": "Chat with the model backend (POST, rate limited)",
            "/api/v1/status": "Platform status",
        },
    });
    (StatusCode::OK, Json(body))
}

// Health check endpoint - lightweight, no auth
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "security": "active",
        "uptime_seconds": state.metrics.start_time.elapsed().as_secs(),
    });
    (StatusCode::OK, Json(body))
}

// Model catalogue, driven by the configured allowlist
pub async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    let models: Vec<ModelInfo> = state
        .config
        .security
        .chat_models
        .iter()
        .map(|id| ModelInfo { id: id.clone(), name: display_name(id), context: 200_000 })
        .collect();
    Json(json!({ "models": models }))
}

fn display_name(id: &str) -> String {
    match id {
        "claude-3-5-sonnet-20241022" => "Claude 3.5 Sonnet".to_string(),
        "claude-3-opus-20250219" => "Claude 3 Opus".to_string(),
        "claude-3-haiku-20250307" => "Claude 3 Haiku".to_string(),
        "claude-sonnet-4-20250514" => "Claude Sonnet 4".to_string(),
        "claude-opus-4-20250514" => "Claude Opus 4".to_string(),
        other => other.to_string(),
    }
}

// Platform status - public, exposes only the aggregate block count
pub async fn platform_status(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "platform": env!("CARGO_PKG_NAME"),
        "status": "operational",
        "active_blocks": state.ledger.blocked_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    (StatusCode::OK, Json(body))
}

// JSON 404 fallback. Unknown paths are often probes, so they go to the audit
// trail - logged, not counted as violations.
pub async fn not_found(
    State(state): State<AppState>,
    MaybeRemoteAddr(addr): MaybeRemoteAddr,
    headers: HeaderMap,
    uri: Uri,
) -> impl IntoResponse {
    let ip = extract_ip_from_headers(&headers, addr.map(|a| a.ip()));
    state.audit.append(EventKind::NotFound, ip, uri.path(), None);
    AppError::NotFound("Endpoint not found".to_string())
}
