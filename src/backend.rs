use async_trait::async_trait;

use crate::error::{AppError, AppResult};

/// A completed chat exchange returned by the upstream model service.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub message: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Boundary to the external chat collaborator.
///
/// The gateway hands a request to this trait only after it has cleared the
/// full admission pipeline; everything behind it (HTTP client, retries,
/// upstream credentials) is the collaborator's concern.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, model: &str, message: &str) -> AppResult<ChatReply>;
}

/// Placeholder wired in when no upstream is configured.
pub struct UnconfiguredBackend;

#[async_trait]
impl ChatBackend for UnconfiguredBackend {
    async fn complete(&self, _model: &str, _message: &str) -> AppResult<ChatReply> {
        Err(AppError::ServiceUnavailable("Chat backend not configured".to_string()))
    }
}
