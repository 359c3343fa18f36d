use axum::{extract::State, http::HeaderMap, Json};

use crate::error::{AppError, AppResult};
use crate::middleware::ip::{extract_ip_from_headers, MaybeRemoteAddr};
use crate::security::sanitize::sanitize_value;
use crate::state::AppState;
use crate::types::{ChatRequest, ChatResponse, ChatUsage};

/// `POST /api/chat` - admission for the paid upstream model call.
///
/// Runs behind the API-key layer and the chat rate class. The message is
/// sanitized and length-capped before it crosses the backend boundary; an
/// unknown model name counts as a violation and falls back to the configured
/// default rather than failing the request.
pub async fn chat(
    State(state): State<AppState>,
    MaybeRemoteAddr(addr): MaybeRemoteAddr,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let sec = &state.config.security;

    let Some(raw_message) = body.message else {
        return Err(AppError::BadRequest("Message required".to_string()));
    };
    let message = sanitize_value(&raw_message, Some(sec.max_message_length));
    if message.is_empty() {
        return Err(AppError::BadRequest("Message too short".to_string()));
    }

    let model = match body.model {
        Some(m) if sec.chat_models.contains(&m) => m,
        Some(m) => {
            let ip = extract_ip_from_headers(&headers, addr.map(|a| a.ip()));
            state.record_violation(ip, &format!("Invalid model requested: {}", m));
            sec.default_chat_model.clone()
        }
        None => sec.default_chat_model.clone(),
    };

    let reply = state.chat_backend.complete(&model, &message).await?;

    Ok(Json(ChatResponse {
        message: reply.message,
        model: reply.model,
        usage: ChatUsage { input_tokens: reply.input_tokens, output_tokens: reply.output_tokens },
    }))
}
