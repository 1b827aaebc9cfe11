//! Account handlers
//! Mission: Register, login, refresh, logout, and profile lookup

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::api::extract::ApiJson;
use crate::auth::models::{LoginRequest, RefreshRequest, RegisterRequest, TokenPair};
use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::UserRecord;

const MIN_PASSWORD_LEN: usize = 8;

fn token_pair(state: &AppState, user: &UserRecord) -> Result<TokenPair, ApiError> {
    let identity = Identity {
        id: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
    };

    let access_token = state
        .codec
        .issue_access(&identity)
        .map_err(|e| state.internal(anyhow::anyhow!("Failed to sign access token: {e}")))?;
    let refresh_token = state
        .codec
        .issue_refresh(&identity)
        .map_err(|e| state.internal(anyhow::anyhow!("Failed to sign refresh token: {e}")))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = body.email.trim();
    let name = body.name.trim();

    if email.is_empty() || body.password.is_empty() || name.is_empty() {
        return Err(ApiError::Validation(
            "Email, password and name are required".to_string(),
        ));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    let user = state
        .users
        .create(email, &body.password, name)
        .await
        .map_err(|e| state.store_error(e))?;

    let tokens = token_pair(&state, &user)?;
    info!("User registered: {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": user,
            "tokens": tokens,
        })),
    ))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same 401 so the endpoint
/// doesn't leak which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = state
        .users
        .find_by_email(email)
        .await
        .map_err(|e| state.store_error(e))?
        .filter(|user| user.verify_password(&body.password))
        .ok_or_else(|| ApiError::Auth("Invalid email or password".to_string()))?;

    let record = user.record();
    let tokens = token_pair(&state, &record)?;
    info!("User logged in: {}", record.email);

    Ok(Json(json!({
        "message": "Login successful",
        "user": record,
        "tokens": tokens,
    })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.refresh_token.is_empty() {
        return Err(ApiError::Validation("Refresh token is required".to_string()));
    }

    let access_token = state
        .codec
        .refresh_access(&body.refresh_token)
        .map_err(|e| ApiError::Auth(e.to_string()))?;

    Ok(Json(json!({
        "message": "Token refreshed successfully",
        "accessToken": access_token,
    })))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; logout is client-side. The endpoint exists so
/// clients have a uniform call to clear their session against.
pub async fn logout(Extension(identity): Extension<Identity>) -> Json<Value> {
    info!("User logged out: {}", identity.email);
    Json(json!({ "message": "Logout successful" }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_id(&identity.id)
        .await
        .map_err(|e| state.store_error(e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": "Profile retrieved successfully",
        "user": user,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_token_pair_wire_names() {
        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
    }

    #[test]
    fn test_role_default_is_user() {
        assert_eq!(Role::default(), Role::User);
    }
}
