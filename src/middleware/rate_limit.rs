//! Rate limiting middleware.
//!
//! Fixed-window in-memory counters per (limiter instance, client IP).
//! Each route class gets its own independently tuned instance; instances
//! compose by short-circuit, the outermost exceeded limiter wins.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config::Environment;

/// Configuration for one limiter instance.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Instance name, for logs.
    pub name: &'static str,
    /// Window duration. The counter resets at fixed boundaries, not sliding.
    pub window: Duration,
    /// Maximum admitted requests per window.
    pub max: u32,
    /// Revert the increment when the response finishes below 400.
    pub skip_successful: bool,
    /// Human-readable rejection message.
    pub message: &'static str,
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// One fixed-window limiter. Cloning shares the underlying counters, so a
/// clone per layer still counts against the same windows.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<HashMap<IpAddr, WindowEntry>>>,
}

pub enum Decision {
    Admitted { remaining: u32, reset_in: Duration },
    Rejected { retry_after: Duration },
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit-and-increment, or reject once the window is full.
    pub fn check(&self, ip: IpAddr) -> Decision {
        let mut state = self.state.lock();
        let now = Instant::now();

        let entry = state.entry(ip).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        // Fixed window: reset at the boundary.
        if now.duration_since(entry.window_start) >= self.config.window {
            entry.count = 0;
            entry.window_start = now;
        }

        let reset_in = (entry.window_start + self.config.window).duration_since(now);

        if entry.count >= self.config.max {
            return Decision::Rejected {
                retry_after: reset_in,
            };
        }

        entry.count += 1;
        Decision::Admitted {
            remaining: self.config.max - entry.count,
            reset_in,
        }
    }

    /// Revert one admission, used when `skip_successful` limiters observe a
    /// response that finished below 400.
    pub fn forgive(&self, ip: IpAddr) {
        let mut state = self.state.lock();
        if let Some(entry) = state.get_mut(&ip) {
            entry.count = entry.count.saturating_sub(1);
        }
    }

    /// Drop windows that expired more than one window ago.
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        let window = self.config.window;
        state.retain(|_, entry| now.duration_since(entry.window_start) < window * 2);
    }
}

/// Rate limiting middleware function, one layer per limiter instance.
pub async fn rate_limit(
    State(limiter): State<FixedWindowLimiter>,
    addr: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    // Keying on the client network address is a known accuracy limitation:
    // NAT'd clients share a counter and the address is spoofable. Preserved
    // deliberately; see DESIGN.md.
    let ip = addr
        .map(|ConnectInfo(a)| a.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(ip) {
        Decision::Admitted {
            remaining,
            reset_in,
        } => {
            let mut response = next.run(request).await;

            if limiter.config.skip_successful && response.status().as_u16() < 400 {
                limiter.forgive(ip);
            }

            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("ratelimit-limit"),
                header_num(limiter.config.max as u64),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-remaining"),
                header_num(remaining as u64),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-reset"),
                header_num(reset_in.as_secs()),
            );
            response
        }
        Decision::Rejected { retry_after } => {
            warn!(
                limiter = limiter.config.name,
                ip = %ip,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );

            let retry_after_secs = retry_after.as_secs().max(1);
            let body = serde_json::json!({
                "error": limiter.config.message,
                "status": 429,
                "retryAfter": retry_after_secs,
                "limit": limiter.config.max,
                "windowMs": limiter.config.window.as_millis() as u64,
            });

            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("retry-after"),
                header_num(retry_after_secs),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-limit"),
                header_num(limiter.config.max as u64),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-remaining"),
                header_num(0),
            );
            // Same clamped value as retry-after and the body's retryAfter;
            // a sub-second window remainder must not read as 0.
            headers.insert(
                HeaderName::from_static("ratelimit-reset"),
                header_num(retry_after_secs),
            );
            response
        }
    }
}

fn header_num(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("0"))
}

/// The full set of limiter instances, constructed once at startup and torn
/// down with the process. Windows are independent: exhausting the auth
/// limiter leaves the global counter untouched. Clones share counters.
#[derive(Clone)]
pub struct RateLimiters {
    pub global: FixedWindowLimiter,
    pub auth: FixedWindowLimiter,
    pub register: FixedWindowLimiter,
    pub api: FixedWindowLimiter,
    pub sensitive: FixedWindowLimiter,
    pub error: FixedWindowLimiter,
}

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);
const ONE_HOUR: Duration = Duration::from_secs(60 * 60);

impl RateLimiters {
    /// Production ceilings; non-production deployments get 10x headroom so
    /// local development and test suites don't trip the limiters.
    pub fn new(environment: Environment) -> Self {
        let scale = if environment.is_production() { 1 } else { 10 };

        let limiter = |name, window, max: u32, skip_successful, message| {
            FixedWindowLimiter::new(RateLimitConfig {
                name,
                window,
                max: max * scale,
                skip_successful,
                message,
            })
        };

        Self {
            global: limiter(
                "global",
                FIFTEEN_MINUTES,
                100,
                true,
                "Too many requests from this IP. Please try again later.",
            ),
            auth: limiter(
                "auth",
                FIFTEEN_MINUTES,
                5,
                false,
                "Too many login attempts. Please try again in 15 minutes.",
            ),
            register: limiter(
                "register",
                ONE_HOUR,
                3,
                false,
                "Too many registration attempts. Please try again in 1 hour.",
            ),
            api: limiter(
                "api",
                FIFTEEN_MINUTES,
                1000,
                true,
                "Too many API requests. Please try again later.",
            ),
            sensitive: limiter(
                "sensitive",
                FIFTEEN_MINUTES,
                50,
                true,
                "Too many requests on this sensitive route. Please try again later.",
            ),
            error: limiter(
                "error",
                FIFTEEN_MINUTES,
                20,
                true,
                "Too many errors detected. Please try again later.",
            ),
        }
    }

    fn all(&self) -> [&FixedWindowLimiter; 6] {
        [
            &self.global,
            &self.auth,
            &self.register,
            &self.api,
            &self.sensitive,
            &self.error,
        ]
    }

    /// Evict stale windows from every instance. Called from a periodic
    /// background task so the per-IP maps don't grow for the life of the
    /// process.
    pub fn cleanup_all(&self) {
        for limiter in self.all() {
            limiter.cleanup();
        }
    }
}
