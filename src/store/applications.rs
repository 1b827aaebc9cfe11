//! Application store
//! Mission: CRUD and reporting over the hosted `applications` table

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::store::supabase::{StoreError, SupabaseClient};

const TABLE: &str = "applications";
const ALL_COLUMNS: &str = "*";

/// Columns a client may sort by. Anything else falls back to the default.
const SORTABLE_COLUMNS: &[&str] = &[
    "application_date",
    "company",
    "position",
    "status",
    "created_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Interview,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: String,
    pub user_id: String,
    pub company: String,
    pub position: String,
    pub application_date: String,
    pub status: ApplicationStatus,
    pub location: Option<String>,
    pub salary: Option<Value>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

/// POST /api/applications body. `user_id` always comes from the verified
/// identity, never from the client.
#[derive(Debug, Deserialize)]
pub struct NewApplication {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub application_date: String,
    pub status: Option<ApplicationStatus>,
    pub location: Option<String>,
    pub salary: Option<Value>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/applications query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListOptions {
    pub status: Option<ApplicationStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    #[serde(rename = "orderDirection")]
    pub order_direction: Option<String>,
}

/// GET /api/applications/search query parameters.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchOptions {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<ApplicationStatus>,
    #[serde(rename = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(rename = "dateTo")]
    pub date_to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Default, Serialize)]
pub struct StatusCounts {
    pub pending: u32,
    pub interview: u32,
    pub rejected: u32,
    pub accepted: u32,
    pub total: u32,
}

/// Result row of the `get_user_application_stats` database function.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserStats {
    pub total_applications: i64,
    pub pending_count: i64,
    pub interview_count: i64,
    pub rejected_count: i64,
    pub accepted_count: i64,
    pub success_rate: f64,
}

#[derive(Clone)]
pub struct ApplicationStore {
    db: SupabaseClient,
}

impl ApplicationStore {
    pub fn new(db: SupabaseClient) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: &str,
        new: &NewApplication,
    ) -> Result<ApplicationRecord, StoreError> {
        let record = self
            .db
            .insert::<ApplicationRecord>(
                TABLE,
                ALL_COLUMNS,
                &json!({
                    "user_id": user_id,
                    "company": new.company,
                    "position": new.position,
                    "application_date": new.application_date,
                    "status": new.status.unwrap_or(ApplicationStatus::Pending),
                    "location": new.location,
                    "salary": new.salary,
                    "contact_person": new.contact_person,
                    "contact_email": new.contact_email,
                    "contact_phone": new.contact_phone,
                    "job_description": new.job_description,
                    "notes": new.notes,
                }),
            )
            .await?;

        info!(
            "Created application {} for user {}: {} @ {}",
            record.id, user_id, record.position, record.company
        );
        Ok(record)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ApplicationRecord>, StoreError> {
        self.db
            .select_one(
                TABLE,
                ALL_COLUMNS,
                &[("id".to_string(), format!("eq.{id}"))],
            )
            .await
    }

    pub async fn find_by_user(
        &self,
        user_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        let mut filters = vec![("user_id".to_string(), format!("eq.{user_id}"))];

        if let Some(status) = options.status {
            filters.push(("status".to_string(), format!("eq.{}", status.as_str())));
        }

        filters.push(("order".to_string(), order_clause(options)));
        push_pagination(&mut filters, options.limit, options.offset);

        self.db.select(TABLE, ALL_COLUMNS, &filters).await
    }

    /// Patch an application. Protected columns in the client-supplied patch
    /// are ignored rather than rejected.
    pub async fn update(
        &self,
        id: &str,
        mut patch: Map<String, Value>,
    ) -> Result<ApplicationRecord, StoreError> {
        for protected in ["id", "user_id", "created_at"] {
            patch.remove(protected);
        }

        self.db
            .update(
                TABLE,
                ALL_COLUMNS,
                &[("id".to_string(), format!("eq.{id}"))],
                &Value::Object(patch),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.db
            .delete(TABLE, &[("id".to_string(), format!("eq.{id}"))])
            .await
    }

    pub async fn search(
        &self,
        user_id: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        let mut filters = vec![("user_id".to_string(), format!("eq.{user_id}"))];

        if let Some(company) = options.company.as_deref().filter(|v| !v.is_empty()) {
            filters.push(("company".to_string(), format!("ilike.*{company}*")));
        }
        if let Some(position) = options.position.as_deref().filter(|v| !v.is_empty()) {
            filters.push(("position".to_string(), format!("ilike.*{position}*")));
        }
        if let Some(status) = options.status {
            filters.push(("status".to_string(), format!("eq.{}", status.as_str())));
        }
        if let Some(from) = options.date_from.as_deref().filter(|v| !v.is_empty()) {
            filters.push(("application_date".to_string(), format!("gte.{from}")));
        }
        if let Some(to) = options.date_to.as_deref().filter(|v| !v.is_empty()) {
            filters.push(("application_date".to_string(), format!("lte.{to}")));
        }

        filters.push(("order".to_string(), "application_date.desc".to_string()));
        push_pagination(&mut filters, options.limit, options.offset);

        self.db.select(TABLE, ALL_COLUMNS, &filters).await
    }

    /// Applications whose `application_date` falls in the last `days` days.
    pub async fn recent(
        &self,
        user_id: &str,
        days: i64,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        let cutoff = (Utc::now() - ChronoDuration::days(days))
            .date_naive()
            .to_string();

        self.db
            .select(
                TABLE,
                ALL_COLUMNS,
                &[
                    ("user_id".to_string(), format!("eq.{user_id}")),
                    ("application_date".to_string(), format!("gte.{cutoff}")),
                    ("order".to_string(), "application_date.desc".to_string()),
                ],
            )
            .await
    }

    /// Tally applications by status in process; the row set per user is
    /// small enough that a dedicated aggregate isn't warranted.
    pub async fn count_by_status(&self, user_id: &str) -> Result<StatusCounts, StoreError> {
        #[derive(Deserialize)]
        struct StatusRow {
            status: ApplicationStatus,
        }

        let rows = self
            .db
            .select::<StatusRow>(
                TABLE,
                "status",
                &[("user_id".to_string(), format!("eq.{user_id}"))],
            )
            .await?;

        let mut counts = StatusCounts::default();
        for row in &rows {
            match row.status {
                ApplicationStatus::Pending => counts.pending += 1,
                ApplicationStatus::Interview => counts.interview += 1,
                ApplicationStatus::Rejected => counts.rejected += 1,
                ApplicationStatus::Accepted => counts.accepted += 1,
            }
        }
        counts.total = rows.len() as u32;
        Ok(counts)
    }

    /// Aggregated stats computed by a database function.
    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, StoreError> {
        let rows = self
            .db
            .rpc::<Vec<UserStats>>(
                "get_user_application_stats",
                &json!({ "user_id_param": user_id }),
            )
            .await?;

        Ok(rows.into_iter().next().unwrap_or_default())
    }
}

fn order_clause(options: &ListOptions) -> String {
    let column = options
        .order_by
        .as_deref()
        .filter(|c| SORTABLE_COLUMNS.contains(c))
        .unwrap_or("application_date");
    let direction = match options.order_direction.as_deref() {
        Some("asc") => "asc",
        _ => "desc",
    };
    format!("{column}.{direction}")
}

fn push_pagination(filters: &mut Vec<(String, String)>, limit: Option<u32>, offset: Option<u32>) {
    filters.push(("limit".to_string(), limit.unwrap_or(100).to_string()));
    filters.push(("offset".to_string(), offset.unwrap_or(0).to_string()));
}
