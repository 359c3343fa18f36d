use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::app::build_router;
use crate::backend::{ChatBackend, ChatReply};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::state::AppState;

/// Chat backend stand-in that records every call it receives.
struct MockBackend {
    calls: Mutex<Vec<(String, String)>>,
}

impl MockBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()) })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, model: &str, message: &str) -> AppResult<ChatReply> {
        self.calls.lock().unwrap().push((model.to_string(), message.to_string()));
        Ok(ChatReply {
            message: "mock reply".to_string(),
            model: model.to_string(),
            input_tokens: 3,
            output_tokens: 5,
        })
    }
}

fn test_state(mutate: impl FnOnce(&mut AppConfig)) -> (AppState, Arc<MockBackend>) {
    let mut cfg = AppConfig::default();
    mutate(&mut cfg);
    let backend = MockBackend::new();
    let state = AppState::new(cfg, backend.clone()).unwrap();
    (state, backend)
}

fn get(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, ip: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-forwarded-for", ip)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

#[tokio::test]
async fn test_root_and_health_are_public() {
    let (state, _) = test_state(|_| {});
    let app = build_router(state);

    let res = send(&app, get("/", "1.1.1.1")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&app, get("/api/health", "1.1.1.1")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let v = body_json(res).await;
    assert_eq!(v["status"], "healthy");
}

#[tokio::test]
async fn test_security_headers_on_every_outcome() {
    let (state, _) = test_state(|cfg| {
        cfg.security.block_threshold = 1;
        cfg.security.rate_limit_default = "1 per minute".to_string();
    });
    let app = build_router(state);

    // 200 success
    let ok = send(&app, get("/api/health", "2.0.0.1")).await;
    // 401 honeypot trap (also blocks 2.0.0.2 at threshold 1)
    let trap = send(&app, get("/admin", "2.0.0.2")).await;
    // 403 blocked
    let blocked = send(&app, get("/api/health", "2.0.0.2")).await;
    // 429 rate limited (second default-class request from 2.0.0.1)
    let limited = send(&app, get("/api/health", "2.0.0.1")).await;

    for (res, status) in [
        (ok, StatusCode::OK),
        (trap, StatusCode::UNAUTHORIZED),
        (blocked, StatusCode::FORBIDDEN),
        (limited, StatusCode::TOO_MANY_REQUESTS),
    ] {
        assert_eq!(res.status(), status);
        let headers = res.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-xss-protection").unwrap(), "1; mode=block");
        assert_eq!(
            headers.get("strict-transport-security").unwrap(),
            "max-age=31536000; includeSubDomains"
        );
        assert_eq!(
            headers.get("content-security-policy").unwrap(),
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert_eq!(headers.get("referrer-policy").unwrap(), "strict-origin-when-cross-origin");
        assert_eq!(headers.get("server").unwrap(), "torwache");
        assert_eq!(
            headers.get("cache-control").unwrap(),
            "no-store, no-cache, must-revalidate, private"
        );
        assert_eq!(headers.get("pragma").unwrap(), "no-cache");
    }
}

#[tokio::test]
async fn test_honeypot_returns_401_and_counts_one_violation() {
    let (state, _) = test_state(|_| {});
    let app = build_router(state.clone());

    let res = send(&app, get("/wp-admin", "3.0.0.1")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let v = body_json(res).await;
    assert_eq!(v["error"], "Unauthorized");
    assert_eq!(state.ledger.total_violations(), 1);

    // Method does not matter
    let res = send(&app, post_json("/login", "3.0.0.1", serde_json::json!({"user": "admin"}))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.ledger.total_violations(), 2);
}

#[tokio::test]
async fn test_threshold_blocks_and_gate_short_circuits() {
    let (state, _) = test_state(|cfg| cfg.security.block_threshold = 3);
    let app = build_router(state.clone());
    let ip = "4.0.0.1";

    for _ in 0..2 {
        let res = send(&app, get("/admin", ip)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
    assert!(!state.ledger.is_blocked(ip.parse().unwrap()));

    // Third honeypot hit trips the threshold
    let res = send(&app, get("/admin", ip)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(state.ledger.is_blocked(ip.parse().unwrap()));

    // Any request from the blocked identity is rejected at the gate, before
    // honeypot or rate-limit logic: the violation count must not move.
    let violations_before = state.ledger.total_violations();
    let res = send(&app, get("/admin", ip)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let v = body_json(res).await;
    assert_eq!(v["error"]["code"], "IP_BLOCKED");
    assert_eq!(state.ledger.total_violations(), violations_before);

    // Other identities are unaffected
    let res = send(&app, get("/api/health", "4.0.0.2")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_rejects_with_retry_hint_and_violation() {
    let (state, _) = test_state(|cfg| cfg.security.rate_limit_default = "2 per minute".to_string());
    let app = build_router(state.clone());
    let ip = "5.0.0.1";

    assert_eq!(send(&app, get("/api/health", ip)).await.status(), StatusCode::OK);
    assert_eq!(send(&app, get("/api/health", ip)).await.status(), StatusCode::OK);

    let res = send(&app, get("/api/health", ip)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let v = body_json(res).await;
    assert_eq!(v["error"]["code"], "RATE_LIMITED");
    assert!(v["error"]["details"]["retry_after_seconds"].as_u64().unwrap() >= 1);
    assert_eq!(state.ledger.total_violations(), 1);
    assert_eq!(state.metrics.get_snapshot().rate_limited, 1);
}

#[tokio::test]
async fn test_chat_missing_key() {
    let (state, backend) = test_state(|cfg| {
        cfg.security.require_api_key = true;
        cfg.security.api_key = Some("test-secret".to_string());
    });
    let app = build_router(state.clone());

    let res = send(&app, post_json("/api/chat", "6.0.0.1", serde_json::json!({"message": "hi"}))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let v = body_json(res).await;
    assert_eq!(v["error"]["code"], "MISSING_KEY");
    assert_eq!(state.ledger.total_violations(), 1);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_chat_invalid_key_any_length() {
    let (state, backend) = test_state(|cfg| {
        cfg.security.require_api_key = true;
        cfg.security.api_key = Some("test-secret".to_string());
    });
    let app = build_router(state.clone());

    // Wrong length
    let mut req = post_json("/api/chat", "6.0.0.2", serde_json::json!({"message": "hi"}));
    req.headers_mut().insert("x-torwache-api-key", "nope".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"]["code"], "INVALID_KEY");

    // Same length, last char differs
    let mut req = post_json("/api/chat", "6.0.0.2", serde_json::json!({"message": "hi"}));
    req.headers_mut().insert("x-torwache-api-key", "test-secreT".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"]["code"], "INVALID_KEY");

    assert_eq!(state.ledger.total_violations(), 2);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_chat_valid_key_reaches_backend_without_violation() {
    let (state, backend) = test_state(|cfg| {
        cfg.security.require_api_key = true;
        cfg.security.api_key = Some("test-secret".to_string());
    });
    let app = build_router(state.clone());

    let mut req = post_json(
        "/api/chat",
        "6.0.0.3",
        serde_json::json!({"message": "<b>hello</b> there", "model": "claude-3-haiku-20250307"}),
    );
    req.headers_mut().insert("x-torwache-api-key", "test-secret".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let v = body_json(res).await;
    assert_eq!(v["message"], "mock reply");
    assert_eq!(v["model"], "claude-3-haiku-20250307");

    assert_eq!(backend.call_count(), 1);
    // The backend sees the sanitized message
    assert_eq!(backend.calls.lock().unwrap()[0].1, "hello there");
    assert_eq!(state.ledger.total_violations(), 0);
}

#[tokio::test]
async fn test_chat_unknown_model_falls_back_and_records_violation() {
    let (state, backend) = test_state(|_| {});
    let app = build_router(state.clone());

    let res = send(
        &app,
        post_json("/api/chat", "6.0.0.4", serde_json::json!({"message": "hi", "model": "evil-model"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let v = body_json(res).await;
    assert_eq!(v["model"], "claude-3-5-sonnet-20241022");
    assert_eq!(backend.call_count(), 1);
    assert_eq!(state.ledger.total_violations(), 1);
}

#[tokio::test]
async fn test_chat_requires_message() {
    let (state, _) = test_state(|_| {});
    let app = build_router(state);

    let res = send(&app, post_json("/api/chat", "6.0.0.5", serde_json::json!({}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payload_too_large_rejected_before_parsing() {
    let (state, _) = test_state(|cfg| cfg.security.max_body_size = 1024);
    let app = build_router(state.clone());

    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("x-forwarded-for", "7.0.0.1")
        .header("content-type", "application/json")
        .header("content-length", "999999")
        .body(Body::empty())
        .unwrap();
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let v = body_json(res).await;
    assert_eq!(v["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(state.ledger.total_violations(), 1);
}

#[tokio::test]
async fn test_balance_validates_address() {
    let (state, _) = test_state(|_| {});
    let app = build_router(state.clone());

    let addr = format!("0x{}", "a".repeat(40));
    let res =
        send(&app, post_json("/api/base/balance", "8.0.0.1", serde_json::json!({"address": addr}))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let v = body_json(res).await;
    assert_eq!(v["network"], "BASE");

    let res = send(
        &app,
        post_json("/api/base/balance", "8.0.0.1", serde_json::json!({"address": "not-an-address"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.ledger.total_violations(), 1);
}

#[tokio::test]
async fn test_internal_stats_requires_internal_key() {
    let (state, _) = test_state(|cfg| {
        cfg.security.internal_api_key = Some("diag-secret".to_string());
    });
    let app = build_router(state.clone());

    // Seed violations so the stats have content (two, so 9.0.0.1 stays the
    // top violator even after the missing-key attempt below counts one)
    let _ = send(&app, get("/admin", "9.0.0.1")).await;
    let _ = send(&app, get("/admin", "9.0.0.1")).await;

    let res = send(&app, get("/api/internal/security/stats", "9.0.0.2")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let mut req = get("/api/internal/security/stats", "9.0.0.2");
    req.headers_mut().insert("x-internal-key", "diag-secret".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let v = body_json(res).await;
    assert_eq!(v["blocked_ips"], 0);
    assert!(v["total_violations"].as_u64().unwrap() >= 1);
    assert!(v["recent_events"].as_array().unwrap().len() >= 1);
    assert_eq!(v["top_violators"][0]["ip"], "9.0.0.1");
}

#[tokio::test]
async fn test_internal_stats_unreachable_without_configured_key() {
    let (state, _) = test_state(|cfg| cfg.security.internal_api_key = None);
    let app = build_router(state);

    let mut req = get("/api/internal/security/stats", "9.0.0.3");
    req.headers_mut().insert("x-internal-key", "anything".parse().unwrap());
    let res = send(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_path_returns_json_404_and_audits() {
    let (state, _) = test_state(|_| {});
    let app = build_router(state.clone());

    let res = send(&app, get("/no/such/route", "10.0.0.1")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let v = body_json(res).await;
    assert_eq!(v["error"]["code"], "NOT_FOUND");
    // Audited as a probe, not a violation
    assert_eq!(state.ledger.total_violations(), 0);
    let events = state.audit.recent(10);
    assert!(events.iter().any(|e| e.details == "/no/such/route"));
}
