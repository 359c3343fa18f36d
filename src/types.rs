use serde::{Deserialize, Serialize};

use crate::security::AuditEntry;

/// Body of `POST /api/chat`. `message` is kept as a raw JSON value so the
/// sanitizer can coerce non-string payloads instead of rejecting them.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<serde_json::Value>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
    pub usage: ChatUsage,
}

/// Body of `POST /api/base/balance`.
#[derive(Debug, Deserialize)]
pub struct BalanceRequest {
    pub address: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: String,
    pub network: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub context: u32,
}

/// Payload of the internal diagnostics route.
#[derive(Serialize)]
pub struct SecurityStats {
    pub blocked_ips: usize,
    pub total_violations: u64,
    pub recent_events: Vec<AuditEntry>,
    pub top_violators: Vec<TopViolator>,
    pub metrics: crate::metrics::MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct TopViolator {
    pub ip: std::net::IpAddr,
    pub violations: u32,
}
