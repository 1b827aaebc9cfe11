//! Service routes
//! Mission: Welcome, health, demo endpoints, and the 404 fallback

use axum::{
    extract::{OriginalUri, Path, Query},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::extract::ApiJson;
use crate::auth::Identity;
use crate::error::ApiError;

/// GET /
pub async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the BrightPath API!",
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct HelloQuery {
    name: Option<String>,
}

/// GET /api/hello
pub async fn hello(
    Extension(identity): Extension<Identity>,
    Query(query): Query<HelloQuery>,
) -> Json<Value> {
    let name = query.name.as_deref().unwrap_or("World");

    Json(json!({
        "message": format!("Hello {name}! (authenticated as {})", identity.name),
        "timestamp": Utc::now().to_rfc3339(),
        "endpoint": "/api/hello",
        "method": "GET",
        "user": identity,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NewData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// POST /api/data
pub async fn create_data(
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<NewData>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Data created successfully",
            "data": {
                "id": Utc::now().timestamp_millis(),
                "title": body.title,
                "description": body.description,
                "createdAt": Utc::now().to_rfc3339(),
                "createdBy": { "id": identity.id, "name": identity.name },
            },
        })),
    ))
}

/// GET /api/data
///
/// Demo data scoped to the caller. Stands in for a real collection.
pub async fn list_data(Extension(identity): Extension<Identity>) -> Json<Value> {
    let owner = json!({ "id": identity.id, "name": identity.name });
    let data = json!([
        {
            "id": 1,
            "title": "First item",
            "description": "Description of the first item",
            "createdAt": Utc::now().to_rfc3339(),
            "createdBy": owner,
        },
        {
            "id": 2,
            "title": "Second item",
            "description": "Description of the second item",
            "createdAt": Utc::now().to_rfc3339(),
            "createdBy": owner,
        },
    ]);

    Json(json!({
        "message": "Data retrieved successfully",
        "count": 2,
        "data": data,
        "user": identity,
    }))
}

/// GET /api/data/:id
pub async fn get_data(
    Extension(identity): Extension<Identity>,
    Path(id): Path<u64>,
) -> Json<Value> {
    Json(json!({
        "message": "Data retrieved successfully",
        "data": {
            "id": id,
            "title": format!("Item {id}"),
            "description": format!("Description of item {id}"),
            "createdAt": Utc::now().to_rfc3339(),
            "createdBy": { "id": identity.id, "name": identity.name },
        },
    }))
}

/// Fallback for unmatched routes.
pub async fn fallback_404(OriginalUri(uri): OriginalUri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "path": uri.path(),
            "status": 404,
        })),
    )
}
