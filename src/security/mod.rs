//! Process-local threat-tracking state.
//!
//! These stores back the admission pipeline: the violation ledger decides who
//! is blocked, the audit log keeps a bounded trail of security events, and the
//! sanitizer cleans free-text input before it crosses the collaborator
//! boundary. Everything lives in memory and is owned by the application state,
//! not by module-level globals.

pub mod audit;
pub mod ledger;
pub mod sanitize;

pub use audit::{AuditEntry, AuditLog, EventKind};
pub use ledger::ViolationLedger;
