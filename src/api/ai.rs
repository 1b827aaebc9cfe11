//! AI handlers
//! Mission: Validated, authenticated proxies in front of the AI provider

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::ai::{AiClient, Completion, PromptTemplate, COVER_LETTER, PROFESSIONALIZE};
use crate::api::extract::ApiJson;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/ai/cover-letter body
#[derive(Debug, Default, Deserialize)]
pub struct CoverLetterRequest {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// POST /api/ai/professionalize-text body
#[derive(Debug, Default, Deserialize)]
pub struct ProfessionalizeRequest {
    #[serde(rename = "originalText", default)]
    pub original_text: String,
}

fn client(state: &AppState) -> Result<&AiClient, ApiError> {
    state
        .ai
        .as_ref()
        .ok_or_else(|| state.internal(anyhow::anyhow!("AI provider not configured")))
}

fn require_complete(template: &PromptTemplate, vars: &[(&str, &str)]) -> Result<(), ApiError> {
    let missing = template.missing(vars);
    if missing.is_empty() {
        return Ok(());
    }
    Err(ApiError::Validation(format!(
        "Missing required fields: {}",
        missing.join(", ")
    )))
}

fn completion_body(message: &str, completion: Completion) -> Json<Value> {
    Json(json!({
        "message": message,
        "content": completion.content.trim(),
        "usage": completion.usage,
        "model": completion.model,
        "generatedAt": Utc::now().to_rfc3339(),
    }))
}

/// POST /api/ai/cover-letter
pub async fn cover_letter(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<CoverLetterRequest>,
) -> Result<Json<Value>, ApiError> {
    let vars = [
        ("position", body.position.as_str()),
        ("company", body.company.as_str()),
        ("first_name", body.first_name.as_str()),
        ("last_name", body.last_name.as_str()),
        ("email", body.email.as_str()),
        ("phone", body.phone.as_str()),
        ("address", body.address.as_str()),
    ];
    require_complete(&COVER_LETTER, &vars)?;

    let (system, user) = COVER_LETTER.render(&vars);
    let completion = client(&state)?
        .complete(&system, &user)
        .await
        .map_err(|e| state.internal(e))?;

    info!(
        "Cover letter generated for {} ({} @ {})",
        identity.email, body.position, body.company
    );
    Ok(completion_body(
        "Cover letter generated successfully",
        completion,
    ))
}

/// POST /api/ai/professionalize-text
pub async fn professionalize_text(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<ProfessionalizeRequest>,
) -> Result<Json<Value>, ApiError> {
    let vars = [("original_text", body.original_text.as_str())];
    require_complete(&PROFESSIONALIZE, &vars)?;

    let (system, user) = PROFESSIONALIZE.render(&vars);
    let completion = client(&state)?
        .complete(&system, &user)
        .await
        .map_err(|e| state.internal(e))?;

    info!("Text professionalized for {}", identity.email);
    Ok(completion_body(
        "Text professionalized successfully",
        completion,
    ))
}
