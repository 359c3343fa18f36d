use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default capacity of the audit ring. Oldest entries are evicted first.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// The kind of a security-relevant event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A request passed the security checkpoint.
    Request,
    /// A violation was recorded against an identity.
    Violation,
    /// An identity crossed the violation threshold and was blocked.
    IpBlocked,
    /// A request from a currently blocked identity was rejected.
    BlockedRequest,
    /// A request hit no real route - possible reconnaissance.
    NotFound,
}

/// An immutable record of a single security-relevant event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event: EventKind,
    pub ip: IpAddr,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_count: Option<u32>,
}

/// Bounded, append-only audit log.
///
/// Insertion order is chronological order. Appending beyond capacity evicts
/// the oldest entry; this FIFO bound is the only eviction in the gateway.
/// Appends are best-effort: a poisoned lock is recovered so an audit failure
/// can never take down the request path.
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))), capacity }
    }

    /// Records an event, mirroring it to the process log for external capture.
    pub fn append(&self, event: EventKind, ip: IpAddr, details: &str, violation_count: Option<u32>) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            event,
            ip,
            details: details.to_string(),
            violation_count,
        };
        tracing::warn!(?event, %ip, details, "[SECURITY]");

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns the most recent `k` entries, oldest first.
    pub fn recent(&self, k: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let skip = entries.len().saturating_sub(k);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
