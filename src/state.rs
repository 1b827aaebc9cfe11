//! Shared application state
//! Mission: One wiring point for config, token codec, stores, and AI client

use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

use crate::ai::AiClient;
use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::store::{ApplicationStore, StoreError, SupabaseClient, UserStore};

/// Everything handlers need, injected through axum's `State`. Cloning is
/// cheap: each field is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub codec: Arc<TokenCodec>,
    pub users: UserStore,
    pub applications: ApplicationStore,
    pub ai: Option<AiClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let codec = Arc::new(TokenCodec::new(&config.jwt));

        let db = SupabaseClient::new(&config.supabase)?;
        let users = UserStore::new(db.clone());
        let applications = ApplicationStore::new(db);

        let ai = match &config.openai_api_key {
            Some(key) => Some(AiClient::new(key.clone(), config.openai_model.clone())?),
            None => {
                warn!("OPENAI_API_KEY not set; AI routes will return errors");
                None
            }
        };

        Ok(Self {
            config: Arc::new(config),
            codec,
            users,
            applications,
            ai,
        })
    }

    /// Translate a store failure into an HTTP error.
    pub fn store_error(&self, err: StoreError) -> ApiError {
        match err {
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Service(err) => ApiError::internal(self.config.environment, err),
        }
    }

    /// Translate any unrecognized failure into an HTTP error.
    pub fn internal(&self, err: anyhow::Error) -> ApiError {
        ApiError::internal(self.config.environment, err)
    }
}
