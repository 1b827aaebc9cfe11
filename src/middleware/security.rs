//! Security middleware.
//!
//! Hardening headers plus request guards: a payload-size ceiling and JSON
//! content-type enforcement on mutating methods.

use axum::{
    extract::Request,
    http::{
        header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE},
        Method,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Maximum accepted request body size.
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024; // 10MB

/// Add security headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    let set = |headers: &mut axum::http::HeaderMap, name: &'static str, value: &'static str| {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    };

    set(headers, "x-content-type-options", "nosniff");
    set(headers, "x-frame-options", "DENY");
    set(headers, "x-xss-protection", "1; mode=block");
    set(headers, "referrer-policy", "strict-origin-when-cross-origin");
    set(
        headers,
        "permissions-policy",
        "geolocation=(), microphone=(), camera=()",
    );
    set(headers, "x-api-version", "1.0.0");

    response
}

/// Reject oversized payloads (413) and non-JSON bodies on mutating methods
/// (415) before any handler runs.
pub async fn request_guards(request: Request, next: Next) -> Response {
    let content_length = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    if content_length > MAX_BODY_BYTES {
        return ApiError::PayloadTooLarge.into_response();
    }

    let mutating = matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::PATCH
    );
    if mutating && content_length > 0 {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        if !is_json {
            return ApiError::UnsupportedMediaType.into_response();
        }
    }

    next.run(request).await
}
