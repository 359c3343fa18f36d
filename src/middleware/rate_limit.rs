use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::IpAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use super::ip::client_ip;
use crate::config::RateSpec;
use crate::error::AppError;
use crate::state::AppState;

/// A thread-safe rate limiter based on the sliding window algorithm.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<IpAddr, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(spec: RateSpec) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests: spec.max_requests,
            window: spec.window,
        }
    }

    /// Checks whether a request from `ip` is allowed. An allowed request is
    /// recorded; a rejected one returns the retry-after hint in seconds.
    pub async fn check_rate_limit(&self, ip: IpAddr) -> Result<(), u64> {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        let timestamps = requests.entry(ip).or_default();

        // Remove old timestamps outside the window; on time skew keep the
        // timestamp (conservative - never widens the allowance)
        timestamps.retain(|&t| now.checked_duration_since(t).map(|d| d < self.window).unwrap_or(true));

        if timestamps.len() >= self.max_requests {
            let oldest = timestamps.first().copied().unwrap_or(now);
            let retry_after = match now.checked_duration_since(oldest) {
                Some(elapsed) => self.window.saturating_sub(elapsed),
                None => Duration::from_secs(1),
            };
            return Err(retry_after.as_secs().max(1));
        }

        timestamps.push(now);
        Ok(())
    }

    /// Drops expired timestamps and empty entries. Count correctness does not
    /// depend on this - it only bounds memory in long-running processes.
    pub async fn cleanup_old_entries(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, timestamps| {
            timestamps
                .retain(|&t| now.checked_duration_since(t).map(|d| d < self.window).unwrap_or(true));
            !timestamps.is_empty()
        });
    }
}

/// Rate-limit tier assigned to a route by sensitivity and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Broad, generous ceiling.
    Default,
    /// Tight ceiling for routes that invoke a paid upstream API.
    Chat,
    /// Tightest ceiling for sensitive operations.
    Strict,
    /// Internal diagnostics.
    Internal,
}

impl RouteClass {
    pub fn for_path(path: &str) -> Self {
        match path {
            "/api/chat" => RouteClass::Chat,
            "/api/base/balance" => RouteClass::Strict,
            "/api/internal/security/stats" => RouteClass::Internal,
            _ => RouteClass::Default,
        }
    }
}

/// Per-identity limiters for each route class, plus a global ceiling that
/// bounds aggregate load regardless of how many identities attack at once.
#[derive(Clone)]
pub struct GatewayRateLimiter {
    default: RateLimiter,
    chat: RateLimiter,
    strict: RateLimiter,
    internal: RateLimiter,
    global: Arc<RwLock<Vec<Instant>>>,
    global_spec: RateSpec,
}

impl GatewayRateLimiter {
    pub fn new(
        default: RateSpec,
        chat: RateSpec,
        strict: RateSpec,
        internal: RateSpec,
        global: RateSpec,
    ) -> Self {
        Self {
            default: RateLimiter::new(default),
            chat: RateLimiter::new(chat),
            strict: RateLimiter::new(strict),
            internal: RateLimiter::new(internal),
            global: Arc::new(RwLock::new(Vec::new())),
            global_spec: global,
        }
    }

    fn limiter_for(&self, class: RouteClass) -> &RateLimiter {
        match class {
            RouteClass::Default => &self.default,
            RouteClass::Chat => &self.chat,
            RouteClass::Strict => &self.strict,
            RouteClass::Internal => &self.internal,
        }
    }

    /// Applies the global ceiling, then the per-identity ceiling for the
    /// route class. Both must pass.
    pub async fn check(&self, class: RouteClass, ip: IpAddr) -> Result<(), u64> {
        self.check_global().await?;
        self.limiter_for(class).check_rate_limit(ip).await
    }

    async fn check_global(&self) -> Result<(), u64> {
        let now = Instant::now();
        let window = self.global_spec.window;
        let mut timestamps = self.global.write().await;
        timestamps.retain(|&t| now.checked_duration_since(t).map(|d| d < window).unwrap_or(true));
        if timestamps.len() >= self.global_spec.max_requests {
            let oldest = timestamps.first().copied().unwrap_or(now);
            let retry_after = match now.checked_duration_since(oldest) {
                Some(elapsed) => window.saturating_sub(elapsed),
                None => Duration::from_secs(1),
            };
            return Err(retry_after.as_secs().max(1));
        }
        timestamps.push(now);
        Ok(())
    }

    pub async fn cleanup_all(&self) {
        self.default.cleanup_old_entries().await;
        self.chat.cleanup_old_entries().await;
        self.strict.cleanup_old_entries().await;
        self.internal.cleanup_old_entries().await;

        let now = Instant::now();
        let window = self.global_spec.window;
        let mut global = self.global.write().await;
        global.retain(|&t| now.checked_duration_since(t).map(|d| d < window).unwrap_or(true));
    }
}

/// Pipeline stage enforcing request-frequency ceilings per identity and
/// globally. A breach is itself recorded as a violation, so repeat offenders
/// eventually trip the block threshold.
pub async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let ip = client_ip(&req);
    let class = RouteClass::for_path(req.uri().path());

    match state.rate_limiter.check(class, ip).await {
        Ok(()) => next.run(req).await,
        Err(retry_after_seconds) => {
            state.metrics.inc_rate_limited();
            state.record_violation(ip, "Rate limit exceeded");
            AppError::RateLimited { retry_after_seconds }.into_response()
        }
    }
}

/// A background task that periodically prunes expired window entries.
pub async fn cleanup_task(limiter: GatewayRateLimiter) {
    let mut interval = tokio::time::interval(Duration::from_secs(300)); // Clean every 5 minutes
    loop {
        interval.tick().await;
        limiter.cleanup_all().await;
    }
}
