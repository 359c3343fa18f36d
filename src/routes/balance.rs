use axum::{extract::State, http::HeaderMap, Json};

use crate::error::{AppError, AppResult};
use crate::middleware::ip::{extract_ip_from_headers, MaybeRemoteAddr};
use crate::security::sanitize::sanitize_value;
use crate::state::AppState;
use crate::types::{BalanceRequest, BalanceResponse};

const MAX_ADDRESS_LENGTH: usize = 50;

/// `POST /api/base/balance` - strict rate class, API key required.
///
/// The chain lookup itself is not wired up yet; the handler validates the
/// address format and answers with the placeholder payload. Malformed
/// addresses are a violation signal - scanners fuzz this endpoint.
pub async fn base_balance(
    State(state): State<AppState>,
    MaybeRemoteAddr(addr): MaybeRemoteAddr,
    headers: HeaderMap,
    Json(body): Json<BalanceRequest>,
) -> AppResult<Json<BalanceResponse>> {
    let Some(raw_address) = body.address else {
        return Err(AppError::BadRequest("Address required".to_string()));
    };
    let address = sanitize_value(&raw_address, Some(MAX_ADDRESS_LENGTH));

    // 0x-prefixed, 40 hex chars
    if !address.starts_with("0x") || address.len() != 42 {
        let ip = extract_ip_from_headers(&headers, addr.map(|a| a.ip()));
        let shown: String = address.chars().take(10).collect();
        state.record_violation(ip, &format!("Invalid address format: {}...", shown));
        return Err(AppError::BadRequest("Invalid address format".to_string()));
    }

    Ok(Json(BalanceResponse {
        address,
        balance: "0".to_string(),
        network: "BASE".to_string(),
        message: "BASE integration coming soon".to_string(),
    }))
}
