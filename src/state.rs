use std::net::IpAddr;
use std::sync::Arc;

use crate::backend::ChatBackend;
use crate::config::{AppConfig, RateSpec};
use crate::metrics::Metrics;
use crate::middleware::GatewayRateLimiter;
use crate::security::{AuditLog, ViolationLedger};

/// The shared application state.
///
/// One explicitly owned store for everything the pipeline mutates: the
/// violation ledger, the audit log, the rate windows and the metrics. Held by
/// Axum's state extraction so handlers, middleware and background tasks all
/// see the same instance; no module-level globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<ViolationLedger>,
    pub audit: Arc<AuditLog>,
    pub metrics: Metrics,
    pub rate_limiter: GatewayRateLimiter,
    pub chat_backend: Arc<dyn ChatBackend>,
}

impl AppState {
    pub fn new(config: AppConfig, chat_backend: Arc<dyn ChatBackend>) -> anyhow::Result<Self> {
        let sec = &config.security;
        let rate_limiter = GatewayRateLimiter::new(
            RateSpec::parse(&sec.rate_limit_default)?,
            RateSpec::parse(&sec.rate_limit_chat)?,
            RateSpec::parse(&sec.rate_limit_strict)?,
            RateSpec::parse(&sec.rate_limit_internal)?,
            RateSpec::parse(&sec.rate_limit_global)?,
        );

        let audit = Arc::new(AuditLog::default());
        let ledger = Arc::new(ViolationLedger::new(
            sec.block_threshold,
            config.block_duration(),
            Arc::clone(&audit),
        ));

        Ok(Self {
            config: Arc::new(config),
            ledger,
            audit,
            metrics: Metrics::new(),
            rate_limiter,
            chat_backend,
        })
    }

    /// Records a violation against `ip`, keeping the metrics in step with the
    /// ledger. Returns `true` if this violation tripped the block threshold.
    pub fn record_violation(&self, ip: IpAddr, reason: &str) -> bool {
        self.metrics.inc_violations();
        let tripped = self.ledger.record_violation(ip, reason);
        if tripped {
            self.metrics.inc_blocks();
        }
        tripped
    }
}
