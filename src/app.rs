use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::middleware::auth::API_KEY_HEADER;
use crate::routes;
use crate::state::AppState;

/// Builds the full application router with the admission pipeline composed
/// around it.
///
/// Layer order (outermost first): response hardener, CORS, trace, security
/// checkpoint (blocklist gate + honeypot), rate limiter, body-size guard.
/// The hardener is outermost so every branch of the pipeline, including
/// rejections, passes through it. The API-key check applies only to the
/// protected routes.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/chat", post(routes::chat::chat))
        .route("/api/base/balance", post(routes::balance::base_balance))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth::require_api_key));

    let origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(600));

    let max_body_size = state.config.security.max_body_size;

    Router::new()
        .route("/", get(routes::info::root))
        .route("/api/health", get(routes::info::health))
        .route("/api/claude/models", get(routes::info::list_models))
        .route("/api/v1/status", get(routes::info::platform_status))
        .route("/api/internal/security/stats", get(routes::security::security_stats))
        .merge(protected)
        .fallback(routes::info::not_found)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(from_fn_with_state(state.clone(), middleware::validation::body_size_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn_with_state(state, middleware::gate::security_checkpoint_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(from_fn(middleware::security_headers::security_headers_middleware))
}
