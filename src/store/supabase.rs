//! Supabase PostgREST client
//! Mission: Thin typed wrapper over the hosted relational store's REST API

use anyhow::{anyhow, Context};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::SupabaseConfig;

/// Collaborator failures the handlers translate into HTTP statuses.
#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Conflict(String),
    Service(anyhow::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "Record not found"),
            StoreError::Conflict(msg) => write!(f, "{msg}"),
            StoreError::Service(err) => write!(f, "Store error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Service(err)
    }
}

/// Client for the `/rest/v1` surface. Cheap to clone; all stores share the
/// same underlying connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for Supabase")?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.url),
            anon_key: config.anon_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{path}", self.rest_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// `GET /{table}?select={columns}&{filters}` ordered by `order` when set.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<T>, StoreError> {
        debug!(table, ?filters, "Supabase select");

        let response = self
            .request(Method::GET, table)
            .query(&[("select", columns)])
            .query(filters)
            .send()
            .await
            .context("Supabase select request failed")?;

        let response = check(response).await?;
        let rows = response
            .json::<Vec<T>>()
            .await
            .context("Failed to decode Supabase rows")?;
        Ok(rows)
    }

    /// Like [`select`](Self::select) but returns at most one row.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        filters: &[(String, String)],
    ) -> Result<Option<T>, StoreError> {
        let mut filters = filters.to_vec();
        filters.push(("limit".to_string(), "1".to_string()));
        let rows = self.select::<T>(table, columns, &filters).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one record and return its representation.
    pub async fn insert<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        record: &Value,
    ) -> Result<T, StoreError> {
        debug!(table, "Supabase insert");

        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .query(&[("select", columns)])
            .json(&serde_json::json!([record]))
            .send()
            .await
            .context("Supabase insert request failed")?;

        let response = check(response).await?;
        let mut rows = response
            .json::<Vec<T>>()
            .await
            .context("Failed to decode inserted row")?;
        rows.pop()
            .ok_or_else(|| StoreError::Service(anyhow!("Insert returned no row")))
    }

    /// Patch matching rows and return the first updated representation.
    pub async fn update<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        filters: &[(String, String)],
        patch: &Value,
    ) -> Result<T, StoreError> {
        debug!(table, ?filters, "Supabase update");

        let response = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&[("select", columns)])
            .query(filters)
            .json(patch)
            .send()
            .await
            .context("Supabase update request failed")?;

        let response = check(response).await?;
        let mut rows = response
            .json::<Vec<T>>()
            .await
            .context("Failed to decode updated row")?;
        rows.pop().ok_or(StoreError::NotFound)
    }

    pub async fn delete(
        &self,
        table: &str,
        filters: &[(String, String)],
    ) -> Result<(), StoreError> {
        debug!(table, ?filters, "Supabase delete");

        let response = self
            .request(Method::DELETE, table)
            .query(filters)
            .send()
            .await
            .context("Supabase delete request failed")?;

        check(response).await?;
        Ok(())
    }

    /// Call a Postgres function through `/rpc/{function}`.
    pub async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        args: &Value,
    ) -> Result<T, StoreError> {
        debug!(function, "Supabase rpc");

        let response = self
            .request(Method::POST, &format!("rpc/{function}"))
            .json(args)
            .send()
            .await
            .context("Supabase rpc request failed")?;

        let response = check(response).await?;
        let value = response
            .json::<T>()
            .await
            .context("Failed to decode rpc result")?;
        Ok(value)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(StoreError::NotFound),
        StatusCode::CONFLICT => Err(StoreError::Conflict(body)),
        _ => Err(StoreError::Service(anyhow!(
            "Supabase returned {status}: {body}"
        ))),
    }
}
