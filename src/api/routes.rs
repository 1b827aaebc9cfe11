//! Route table
//! Mission: Assemble handlers, gates, and limiter layers into one router

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::{ai, applications, auth, misc};
use crate::auth::{auth_gate, AccessPolicy, Gate};
use crate::middleware::{
    rate_limit::{rate_limit, FixedWindowLimiter},
    request_guards, request_logging, security_headers,
    security::MAX_BODY_BYTES,
    RateLimiters,
};
use crate::state::AppState;

/// Build the full application router.
///
/// Layer order per route, outermost first: CORS, request logging, security
/// headers, request guards, error limiter, global limiter, then any
/// route-class limiter and auth gate, then the handler.
pub fn router(state: AppState, limiters: &RateLimiters) -> Router {
    let codec = state.codec.clone();
    let gate = move |policy: AccessPolicy| {
        from_fn_with_state(Gate::new(codec.clone(), policy), auth_gate)
    };
    let limit = |limiter: &FixedWindowLimiter| from_fn_with_state(limiter.clone(), rate_limit);

    let auth_routes = Router::new()
        .route(
            "/register",
            post(auth::register).layer(limit(&limiters.register)),
        )
        .route("/login", post(auth::login).layer(limit(&limiters.auth)))
        .route("/refresh", post(auth::refresh).layer(limit(&limiters.auth)))
        .route(
            "/logout",
            post(auth::logout).layer(gate(AccessPolicy::RequireAuth)),
        )
        .route(
            "/me",
            get(auth::me)
                .layer(gate(AccessPolicy::RequireAuth))
                .layer(limit(&limiters.sensitive)),
        );

    // Literal segments match before `/:id`, so the reporting routes are safe
    // to declare alongside it.
    let application_routes = Router::new()
        .route("/", get(applications::list).post(applications::create))
        .route("/search", get(applications::search))
        .route("/recent", get(applications::recent))
        .route(
            "/stats",
            get(applications::stats).layer(limit(&limiters.sensitive)),
        )
        .route(
            "/count",
            get(applications::count).layer(limit(&limiters.sensitive)),
        )
        .route(
            "/:id",
            get(applications::get)
                .put(applications::update)
                .delete(applications::delete),
        )
        .layer(gate(AccessPolicy::RequireAuth))
        .layer(limit(&limiters.api));

    // AI calls are expensive upstream; they share the sensitive ceiling.
    let ai_routes = Router::new()
        .route("/cover-letter", post(ai::cover_letter))
        .route("/professionalize-text", post(ai::professionalize_text))
        .layer(gate(AccessPolicy::RequireAuth))
        .layer(limit(&limiters.sensitive));

    let demo_routes = Router::new()
        .route("/hello", get(misc::hello))
        .route("/data", get(misc::list_data).post(misc::create_data))
        .route("/data/:id", get(misc::get_data))
        .layer(gate(AccessPolicy::RequireAuth))
        .layer(limit(&limiters.api));

    Router::new()
        .route("/", get(misc::welcome))
        .route("/health", get(misc::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/applications", application_routes)
        .nest("/api/ai", ai_routes)
        .nest("/api", demo_routes)
        .fallback(misc::fallback_404)
        // axum's default body limit is 2 MB; the documented ceiling is the
        // 10 MB enforced by `request_guards`.
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES as usize))
        .layer(from_fn_with_state(limiters.global.clone(), rate_limit))
        .layer(from_fn_with_state(limiters.error.clone(), rate_limit))
        .layer(from_fn(request_guards))
        .layer(from_fn(security_headers))
        .layer(from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
