use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::ip::client_ip;
use crate::error::AppError;
use crate::state::AppState;

/// Rejects oversized requests on the declared `Content-Length`, before any
/// body parsing. Oversize attempts count as violations. The router's
/// `DefaultBodyLimit` backstops requests that lie about their length.
pub async fn body_size_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let max_body_size = state.config.security.max_body_size;

    if matches!(req.method(), &Method::POST | &Method::PUT) {
        let declared = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(length) = declared {
            if length > max_body_size {
                let ip = client_ip(&req);
                state.record_violation(ip, "Request too large");
                return AppError::PayloadTooLarge { max_bytes: max_body_size }.into_response();
            }
        }
    }

    next.run(req).await
}
