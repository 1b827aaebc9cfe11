//! HTTP error taxonomy
//! Mission: One error type at the boundary, uniform `{error, status}` bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::config::Environment;

/// Errors a handler can surface to the client.
///
/// Every variant maps to one status code and serializes as
/// `{"error": <message>, "status": <code>}`. Internal errors log their full
/// chain server-side and only expose detail outside production.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Auth(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge,
    UnsupportedMediaType,
    Internal { detail: Option<String> },
}

impl ApiError {
    /// Wrap an unrecognized collaborator failure. Logs the chain; the
    /// response carries detail only in non-production deployments.
    pub fn internal(environment: Environment, err: anyhow::Error) -> Self {
        error!("Internal error: {err:#}");
        let detail = if environment.is_production() {
            None
        } else {
            Some(format!("{err:#}"))
        };
        ApiError::Internal { detail }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Validation(msg)
            | ApiError::Auth(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => json!({
                "error": msg,
                "status": status.as_u16(),
            }),
            ApiError::PayloadTooLarge => json!({
                "error": "Payload too large",
                "status": status.as_u16(),
                "maxSize": "10MB",
            }),
            ApiError::UnsupportedMediaType => json!({
                "error": "Unsupported content type. Use application/json",
                "status": status.as_u16(),
            }),
            ApiError::Internal { detail } => {
                let mut body = json!({
                    "error": "Internal server error",
                    "status": status.as_u16(),
                });
                if let Some(detail) = detail {
                    body["details"] = json!(detail);
                }
                body
            }
        };

        (status, Json(body)).into_response()
    }
}
