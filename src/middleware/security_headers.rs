//! Security headers middleware for HTTP responses.
//!
//! Applies a fixed set of defensive headers to every outgoing response,
//! whatever path the request took through the pipeline - success, block,
//! honeypot trap, rate limit or error. Mounted as the outermost layer so no
//! branch can skip it.

use axum::http::header::{CACHE_CONTROL, PRAGMA, SERVER};
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    // Prevent MIME-type sniffing
    headers.insert(HeaderName::from_static("x-content-type-options"), HeaderValue::from_static("nosniff"));

    // This API is never embedded
    headers.insert(HeaderName::from_static("x-frame-options"), HeaderValue::from_static("DENY"));

    headers.insert(HeaderName::from_static("x-xss-protection"), HeaderValue::from_static("1; mode=block"));

    headers.insert(
        HeaderName::from_static("strict-transport-security"),
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    // Pure JSON API: nothing may load anything
    headers.insert(
        HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Generic identifier that does not reveal the underlying stack
    headers.insert(SERVER, HeaderValue::from_static("torwache"));

    // API responses must never be cached
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache, must-revalidate, private"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    res
}
