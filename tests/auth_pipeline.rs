//! End-to-end tests for the request authorization pipeline: bearer token
//! verification, policy gates, limiter layers, and the hardening guards.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Extension, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use brightpath_backend::{
    auth::{auth_gate, AccessPolicy, Gate, Identity, Role, TokenCodec},
    config::{AppConfig, Environment, JwtConfig, SupabaseConfig},
    middleware::rate_limit::{rate_limit, FixedWindowLimiter, RateLimitConfig},
    router, AppState, RateLimiters,
};

fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        port: 0,
        jwt: JwtConfig {
            access_secret: "access-secret-for-tests-0123456789".to_string(),
            refresh_secret: "refresh-secret-for-tests-0123456789".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        },
        // Points nowhere; these tests never reach the store.
        supabase: SupabaseConfig {
            url: "http://127.0.0.1:9".to_string(),
            anon_key: "test-anon-key".to_string(),
        },
        openai_api_key: None,
        openai_model: "gpt-3.5-turbo".to_string(),
    }
}

fn test_app() -> (Router, AppState) {
    let state = AppState::new(test_config()).expect("state should build");
    let limiters = RateLimiters::new(Environment::Development);
    (router(state.clone(), &limiters), state)
}

fn user_identity() -> Identity {
    Identity {
        id: "user-1".to_string(),
        email: "ada@example.com".to_string(),
        name: "Ada".to_string(),
        role: Role::User,
    }
}

fn admin_identity() -> Identity {
    Identity {
        id: "admin-1".to_string(),
        email: "root@example.com".to_string(),
        name: "Root".to_string(),
        role: Role::Admin,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

fn get_request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = test_app();
    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn security_headers_on_every_response() {
    let (app, _) = test_app();
    let response = app.oneshot(get_request("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().contains_key("x-api-version"));
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn protected_route_requires_token() {
    let (app, _) = test_app();
    let response = app.oneshot(get_request("/api/hello", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Access token required");
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn malformed_authorization_header_rejected() {
    let (app, _) = test_app();
    let request = Request::builder()
        .uri("/api/hello")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid authorization format. Use: Bearer <token>");
}

#[tokio::test]
async fn tampered_token_rejected() {
    let (app, state) = test_app();
    let token = state.codec.issue_access(&user_identity()).unwrap();

    let mut tampered = token.into_bytes();
    let last = tampered.len() - 1;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let response = app
        .oneshot(get_request("/api/hello", Some(&tampered)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_handler_with_identity() {
    let (app, state) = test_app();
    let token = state.codec.issue_access(&user_identity()).unwrap();

    let response = app
        .oneshot(get_request("/api/hello?name=Rust", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Rust"));
    assert_eq!(body["user"]["id"], "user-1");
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn refresh_mints_verifiable_access_token() {
    let (app, state) = test_app();
    let refresh = state.codec.issue_refresh(&user_identity()).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "refreshToken": refresh }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let access = body["accessToken"].as_str().unwrap();
    let identity = state.codec.verify_access(access).unwrap();
    assert_eq!(identity.id, "user-1");
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let (app, state) = test_app();
    let access = state.codec.issue_access(&user_identity()).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "refreshToken": access }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn empty_refresh_token_is_validation_error() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_gets_json_404() {
    let (app, _) = test_app();
    let response = app
        .oneshot(get_request("/definitely/not/here", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Route not found");
    assert_eq!(body["path"], "/definitely/not/here");
}

#[tokio::test]
async fn non_json_mutation_rejected() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("refresh please"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn large_body_under_ceiling_reaches_handler() {
    let (app, _) = test_app();

    // 3 MB of token, well over axum's 2 MB default body limit but under the
    // advertised 10 MB ceiling. The handler must see it and reject the token
    // itself, not the body size.
    let payload = json!({ "refreshToken": "x".repeat(3 * 1024 * 1024) }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn malformed_json_gets_uniform_error_body() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_payload_rejected() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, 11 * 1024 * 1024)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["maxSize"], "10MB");
}

fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(&test_config().jwt))
}

fn gated_router(codec: Arc<TokenCodec>, policy: AccessPolicy, path: &str) -> Router {
    async fn handler(Extension(identity): Extension<Identity>) -> String {
        identity.id
    }

    Router::new()
        .route(path, get(handler))
        .layer(from_fn_with_state(Gate::new(codec, policy), auth_gate))
}

#[tokio::test]
async fn role_gate_blocks_non_admin() {
    let codec = codec();
    let app = gated_router(
        codec.clone(),
        AccessPolicy::RequireRole(&[Role::Admin]),
        "/admin",
    );

    let user_token = codec.issue_access(&user_identity()).unwrap();
    let response = app
        .clone()
        .oneshot(get_request("/admin", Some(&user_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Insufficient permissions");

    let admin_token = codec.issue_access(&admin_identity()).unwrap();
    let response = app
        .oneshot(get_request("/admin", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ownership_gate_matches_path_param() {
    let codec = codec();
    let app = gated_router(
        codec.clone(),
        AccessPolicy::RequireOwnership("user_id"),
        "/users/:user_id",
    );

    let token = codec.issue_access(&user_identity()).unwrap();

    // Own resource passes.
    let response = app
        .clone()
        .oneshot(get_request("/users/user-1", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Someone else's resource is forbidden.
    let response = app
        .clone()
        .oneshot(get_request("/users/user-2", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized access to this resource");

    // Admins bypass ownership.
    let admin_token = codec.issue_access(&admin_identity()).unwrap();
    let response = app
        .oneshot(get_request("/users/user-2", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn optional_auth_passes_without_token() {
    async fn handler(identity: Option<Extension<Identity>>) -> String {
        identity
            .map(|Extension(i)| i.id)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    let codec = codec();
    let app = Router::new().route("/feed", get(handler)).layer(
        from_fn_with_state(
            Gate::new(codec.clone(), AccessPolicy::OptionalAuth),
            auth_gate,
        ),
    );

    let response = app
        .clone()
        .oneshot(get_request("/feed", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Garbage tokens are swallowed, not rejected.
    let response = app
        .clone()
        .oneshot(get_request("/feed", Some("garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let token = codec.issue_access(&user_identity()).unwrap();
    let response = app.oneshot(get_request("/feed", Some(&token))).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"user-1");
}

#[tokio::test]
async fn limiter_rejects_with_retry_metadata() {
    async fn handler() -> &'static str {
        "ok"
    }

    let limiter = FixedWindowLimiter::new(RateLimitConfig {
        name: "test",
        window: Duration::from_secs(60),
        max: 2,
        skip_successful: false,
        message: "Too many requests from this IP. Please try again later.",
    });
    let app = Router::new()
        .route("/limited", get(handler))
        .layer(from_fn_with_state(limiter, rate_limit));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_request("/limited", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("ratelimit-remaining"));
    }

    let response = app.oneshot(get_request("/limited", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["ratelimit-remaining"], "0");
    assert!(response.headers().contains_key("retry-after"));

    let body = body_json(response).await;
    assert_eq!(body["status"], 429);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["windowMs"], 60_000);
    assert!(body["retryAfter"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn rejection_headers_agree_on_sub_second_windows() {
    async fn handler() -> &'static str {
        "ok"
    }

    let limiter = FixedWindowLimiter::new(RateLimitConfig {
        name: "test",
        window: Duration::from_secs(1),
        max: 1,
        skip_successful: false,
        message: "too many",
    });
    let app = Router::new()
        .route("/limited", get(handler))
        .layer(from_fn_with_state(limiter, rate_limit));

    let response = app
        .clone()
        .oneshot(get_request("/limited", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The remaining window truncates to 0 whole seconds here; every reported
    // value must carry the same clamped figure.
    let response = app.oneshot(get_request("/limited", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "1");
    assert_eq!(response.headers()["ratelimit-reset"], "1");

    let body = body_json(response).await;
    assert_eq!(body["retryAfter"], 1);
}
