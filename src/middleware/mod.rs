//! Middleware for rate limiting, observability, and request hardening.
//!
//! This module provides:
//! - Fixed-window rate limiting per client IP, one instance per route class
//! - Request logging with latency tracking
//! - Security headers and payload/content-type guards

pub mod logging;
pub mod rate_limit;
pub mod security;

pub use logging::request_logging;
pub use rate_limit::{FixedWindowLimiter, RateLimitConfig, RateLimiters};
pub use security::{request_guards, security_headers};
