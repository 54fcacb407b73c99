//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `UserRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Each user is a single row. The chat sessions and their summaries are embedded in
//! the `chat_sessions` JSONB column and always written back together with the row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use summarizer_core::domain::{ChatSession, SummaryItem, SummaryParameters, User};
use summarizer_core::ports::{PortError, PortResult, UserRepository};
use tracing::error;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserRepository` port.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Creates a new `PgUserRepository`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    version: i64,
    chat_sessions: Json<Vec<ChatSessionDocument>>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
            is_active: self.is_active,
            created_at: self.created_at,
            version: self.version,
            chat_sessions: self.chat_sessions.0.into_iter().map(ChatSessionDocument::to_domain).collect(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ChatSessionDocument {
    id: Uuid,
    title: String,
    #[serde(default)]
    summaries: Vec<SummaryItemDocument>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    meta_summary: Option<String>,
}

impl ChatSessionDocument {
    fn from_domain(session: &ChatSession) -> Self {
        Self {
            id: session.id,
            title: session.title.clone(),
            summaries: session.summaries.iter().map(SummaryItemDocument::from_domain).collect(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            meta_summary: session.meta_summary.clone(),
        }
    }

    fn to_domain(self) -> ChatSession {
        ChatSession {
            id: self.id,
            title: self.title,
            summaries: self.summaries.into_iter().map(SummaryItemDocument::to_domain).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            meta_summary: self.meta_summary,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SummaryItemDocument {
    id: Uuid,
    original_text: String,
    summary_text: String,
    parameters: ParametersDocument,
    created_at: DateTime<Utc>,
}

impl SummaryItemDocument {
    fn from_domain(item: &SummaryItem) -> Self {
        Self {
            id: item.id,
            original_text: item.original_text.clone(),
            summary_text: item.summary_text.clone(),
            parameters: ParametersDocument::from(item.parameters),
            created_at: item.created_at,
        }
    }

    fn to_domain(self) -> SummaryItem {
        SummaryItem {
            id: self.id,
            original_text: self.original_text,
            summary_text: self.summary_text,
            parameters: self.parameters.into(),
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ParametersDocument {
    min_length: i64,
    max_length: i64,
    do_sample: bool,
}

impl From<SummaryParameters> for ParametersDocument {
    fn from(p: SummaryParameters) -> Self {
        Self {
            min_length: p.min_length,
            max_length: p.max_length,
            do_sample: p.do_sample,
        }
    }
}

impl From<ParametersDocument> for SummaryParameters {
    fn from(p: ParametersDocument) -> Self {
        Self {
            min_length: p.min_length,
            max_length: p.max_length,
            do_sample: p.do_sample,
        }
    }
}

const USER_COLUMNS: &str =
    "id, email, hashed_password, is_active, created_at, version, chat_sessions";

/// Maps a unique-constraint violation to `Conflict`, everything else to `Internal`.
fn map_write_error(e: sqlx::Error) -> PortError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return PortError::Conflict("Email already registered".to_string());
        }
    }
    error!("Database write failed: {:?}", e);
    PortError::Internal(e.to_string())
}

fn map_read_error(e: sqlx::Error) -> PortError {
    error!("Database read failed: {:?}", e);
    PortError::Internal(e.to_string())
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_read_error)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn create(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let user = User::new(email.to_string(), hashed_password.to_string());
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, hashed_password, is_active, created_at, version, chat_sessions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.version)
        .bind(Json(Vec::<ChatSessionDocument>::new()))
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(record.to_domain())
    }

    async fn save(&self, user: &mut User) -> PortResult<()> {
        let sessions: Vec<ChatSessionDocument> =
            user.chat_sessions.iter().map(ChatSessionDocument::from_domain).collect();

        // The version guard turns a lost update into a detectable conflict.
        let new_version: Option<i64> = sqlx::query_scalar(
            "UPDATE users \
             SET email = $3, hashed_password = $4, is_active = $5, chat_sessions = $6, version = version + 1 \
             WHERE id = $1 AND version = $2 \
             RETURNING version",
        )
        .bind(user.id)
        .bind(user.version)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.is_active)
        .bind(Json(sessions))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        match new_version {
            Some(version) => {
                user.version = version;
                Ok(())
            }
            None => Err(PortError::Conflict(
                "The account was modified by another request; reload and retry".to_string(),
            )),
        }
    }

    async fn delete(&self, user: &User) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tree_survives_the_json_document() {
        let mut session = ChatSession::new("Research".to_string());
        session.summaries.push(SummaryItem::new(
            "original".to_string(),
            "summary".to_string(),
            SummaryParameters {
                min_length: 20,
                max_length: 80,
                do_sample: true,
            },
        ));
        session.meta_summary = Some("meta".to_string());

        let json = serde_json::to_value(ChatSessionDocument::from_domain(&session)).unwrap();
        assert_eq!(json["summaries"][0]["parameters"]["max_length"], 80);

        let back: ChatSessionDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back.to_domain(), session);
    }

    #[test]
    fn documents_without_optional_fields_load() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "title": "Legacy",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let session = serde_json::from_value::<ChatSessionDocument>(json).unwrap().to_domain();
        assert!(session.summaries.is_empty());
        assert!(session.meta_summary.is_none());
    }
}
