//! Account store
//! Mission: User records in the hosted `users` table, bcrypt at the edge

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::Role;
use crate::store::supabase::{StoreError, SupabaseClient};

const TABLE: &str = "users";
const PUBLIC_COLUMNS: &str = "id,email,name,role,created_at";
const BCRYPT_COST: u32 = 10;

/// Sanitized user projection. The password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: String,
}

/// Full row used only for credential verification.
#[derive(Debug, Deserialize)]
pub struct UserWithPassword {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: String,
    password: String,
}

impl UserWithPassword {
    pub fn record(&self) -> UserRecord {
        UserRecord {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            created_at: self.created_at.clone(),
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify(password, &self.password).unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct UserStore {
    db: SupabaseClient,
}

impl UserStore {
    pub fn new(db: SupabaseClient) -> Self {
        Self { db }
    }

    /// Create an account. A pre-existing email is a conflict; the race with
    /// a concurrent insert is closed by the table's unique constraint,
    /// which also surfaces as a conflict.
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserRecord, StoreError> {
        let existing = self
            .db
            .select_one::<UserRecord>(
                TABLE,
                PUBLIC_COLUMNS,
                &[("email".to_string(), format!("eq.{email}"))],
            )
            .await?;
        if existing.is_some() {
            return Err(StoreError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let password_hash = hash(password, BCRYPT_COST)
            .map_err(|e| StoreError::Service(anyhow::anyhow!("Failed to hash password: {e}")))?;

        let user = self
            .db
            .insert::<UserRecord>(
                TABLE,
                PUBLIC_COLUMNS,
                &json!({
                    "email": email,
                    "password": password_hash,
                    "name": name,
                    "role": Role::User,
                }),
            )
            .await?;

        info!("Created user: {} ({})", user.email, user.id);
        Ok(user)
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        self.db
            .select_one(
                TABLE,
                "id,email,password,name,role,created_at",
                &[("email".to_string(), format!("eq.{email}"))],
            )
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        self.db
            .select_one(
                TABLE,
                PUBLIC_COLUMNS,
                &[("id".to_string(), format!("eq.{id}"))],
            )
            .await
    }
}
