//! services/api/src/web/rest.rs
//!
//! Shared response types, the liveness endpoint, and the master definition for
//! the OpenAPI specification.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, chat, error::ErrorResponse};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::update_me_handler,
        auth::delete_me_handler,
        chat::create_session_handler,
        chat::list_sessions_handler,
        chat::get_session_handler,
        chat::rename_session_handler,
        chat::delete_session_handler,
        chat::summarize_handler,
        chat::get_summary_handler,
        chat::update_summary_handler,
        chat::delete_summary_handler,
        chat::meta_summarize_handler,
    ),
    components(
        schemas(
            HealthResponse,
            MessageResponse,
            ErrorResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UpdateUserRequest,
            auth::UserResponse,
            chat::ParametersSchema,
            chat::CreateSessionRequest,
            chat::CreateSessionResponse,
            chat::SummaryItemSchema,
            chat::ChatSessionResponse,
            chat::SummaryRequest,
            chat::PartialSummaryRequest,
            chat::SummaryResponse,
            chat::MetaSummaryRequest,
            chat::MetaSummaryResponse,
        )
    ),
    tags(
        (name = "Chat Summarizer API", description = "Chat sessions of text summaries backed by a hosted summarization model.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Response Structs
//=========================================================================================

/// A bare confirmation message.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /health - Liveness only; dependencies are not checked.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The process is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}
