//! Request logging middleware.
//!
//! Logs every HTTP request with method, path, status code, and latency.

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Middleware that logs HTTP requests with timing information.
///
/// Each request gets a generated id, echoed back as `x-request-id` so log
/// lines can be correlated with client reports. INFO for completed requests,
/// WARN for 5xx. Health checks are skipped to reduce noise.
pub async fn request_logging(
    addr: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let request_id = Uuid::new_v4().to_string();
    let client_ip = addr
        .map(|ConnectInfo(a)| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let start = Instant::now();
    let mut response = next.run(request).await;
    let latency = start.elapsed();
    let status = response.status().as_u16();

    if status >= 500 {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency.as_millis() as u64,
            client_ip = %client_ip,
            "Request failed (5xx)"
        );
    } else if status >= 400 {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency.as_millis() as u64,
            client_ip = %client_ip,
            "Request completed (4xx)"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency.as_millis() as u64,
            "Request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), value);
    }
    response
}
