//! Application handlers
//! Mission: CRUD plus reporting over the caller's own application records

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::api::extract::ApiJson;
use crate::auth::{Identity, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{ApplicationRecord, ListOptions, NewApplication, SearchOptions};

/// Load an application and enforce that the caller owns it. Admins may
/// touch any record.
async fn load_owned(
    state: &AppState,
    identity: &Identity,
    id: &str,
) -> Result<ApplicationRecord, ApiError> {
    let record = state
        .applications
        .find_by_id(id)
        .await
        .map_err(|e| state.store_error(e))?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;

    if record.user_id != identity.id && identity.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Unauthorized access to this application".to_string(),
        ));
    }
    Ok(record)
}

/// POST /api/applications
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<NewApplication>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.company.trim().is_empty()
        || body.position.trim().is_empty()
        || body.application_date.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Company, position and application date are required".to_string(),
        ));
    }

    let application = state
        .applications
        .create(&identity.id, &body)
        .await
        .map_err(|e| state.store_error(e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Application created successfully",
            "application": application,
        })),
    ))
}

/// GET /api/applications
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(options): Query<ListOptions>,
) -> Result<Json<Value>, ApiError> {
    let applications = state
        .applications
        .find_by_user(&identity.id, &options)
        .await
        .map_err(|e| state.store_error(e))?;

    Ok(Json(json!({
        "message": "Applications retrieved successfully",
        "count": applications.len(),
        "applications": applications,
        "pagination": {
            "limit": options.limit.unwrap_or(100),
            "offset": options.offset.unwrap_or(0),
        },
    })))
}

/// GET /api/applications/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let application = load_owned(&state, &identity, &id).await?;

    Ok(Json(json!({
        "message": "Application retrieved successfully",
        "application": application,
    })))
}

/// PUT /api/applications/:id
///
/// Accepts a partial document; unknown and protected columns are dropped by
/// the store before the patch is applied.
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    load_owned(&state, &identity, &id).await?;

    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let application = state
        .applications
        .update(&id, patch)
        .await
        .map_err(|e| state.store_error(e))?;
    info!("Application {} updated by {}", id, identity.email);

    Ok(Json(json!({
        "message": "Application updated successfully",
        "application": application,
    })))
}

/// DELETE /api/applications/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    load_owned(&state, &identity, &id).await?;

    state
        .applications
        .delete(&id)
        .await
        .map_err(|e| state.store_error(e))?;
    info!("Application {} deleted by {}", id, identity.email);

    Ok(Json(json!({
        "message": "Application deleted successfully",
    })))
}

/// GET /api/applications/search
pub async fn search(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(options): Query<SearchOptions>,
) -> Result<Json<Value>, ApiError> {
    let applications = state
        .applications
        .search(&identity.id, &options)
        .await
        .map_err(|e| state.store_error(e))?;

    Ok(Json(json!({
        "message": "Search completed successfully",
        "count": applications.len(),
        "applications": applications,
        "searchParams": options,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    days: Option<i64>,
}

/// GET /api/applications/recent
pub async fn recent(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = query.days.unwrap_or(30);
    if !(1..=365).contains(&days) {
        return Err(ApiError::Validation(
            "Days must be between 1 and 365".to_string(),
        ));
    }

    let applications = state
        .applications
        .recent(&identity.id, days)
        .await
        .map_err(|e| state.store_error(e))?;

    Ok(Json(json!({
        "message": "Recent applications retrieved successfully",
        "count": applications.len(),
        "days": days,
        "applications": applications,
    })))
}

/// GET /api/applications/count
pub async fn count(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    let counts = state
        .applications
        .count_by_status(&identity.id)
        .await
        .map_err(|e| state.store_error(e))?;

    Ok(Json(json!({
        "message": "Application counts retrieved successfully",
        "counts": counts,
    })))
}

/// GET /api/applications/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    let stats = state
        .applications
        .user_stats(&identity.id)
        .await
        .map_err(|e| state.store_error(e))?;

    Ok(Json(json!({
        "message": "Statistics retrieved successfully",
        "stats": stats,
    })))
}
