//! services/api/src/web/chat.rs
//!
//! Chat session and summary endpoints. Sessions and summaries are addressed by
//! their zero-based position; each response also carries a stable `uid`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use summarizer_core::{ChatSession, SummaryItem, SummaryParameters, User};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{
    error::{ErrorResponse, HttpError},
    rest::MessageResponse,
    state::AppState,
};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Summarization parameters as sent by clients. Omitted fields take their defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ParametersSchema {
    #[serde(default = "default_min_length")]
    pub min_length: i64,
    #[serde(default = "default_max_length")]
    pub max_length: i64,
    #[serde(default)]
    pub do_sample: bool,
}

fn default_min_length() -> i64 {
    SummaryParameters::default().min_length
}

fn default_max_length() -> i64 {
    SummaryParameters::default().max_length
}

impl From<ParametersSchema> for SummaryParameters {
    fn from(p: ParametersSchema) -> Self {
        Self {
            min_length: p.min_length,
            max_length: p.max_length,
            do_sample: p.do_sample,
        }
    }
}

impl From<SummaryParameters> for ParametersSchema {
    fn from(p: SummaryParameters) -> Self {
        Self {
            min_length: p.min_length,
            max_length: p.max_length,
            do_sample: p.do_sample,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub title: String,
}

#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub session_id: usize,
    pub uid: Uuid,
    pub message: String,
}

#[derive(Deserialize)]
pub struct RenameSessionQuery {
    pub title: String,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryItemSchema {
    pub uid: Uuid,
    pub original_text: String,
    pub summary_text: String,
    pub parameters: ParametersSchema,
    pub created_at: DateTime<Utc>,
}

impl From<&SummaryItem> for SummaryItemSchema {
    fn from(item: &SummaryItem) -> Self {
        Self {
            uid: item.id,
            original_text: item.original_text.clone(),
            summary_text: item.summary_text.clone(),
            parameters: item.parameters.into(),
            created_at: item.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ChatSessionResponse {
    pub id: usize,
    pub uid: Uuid,
    pub title: String,
    pub summaries: Vec<SummaryItemSchema>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub meta_summary: Option<String>,
}

impl ChatSessionResponse {
    fn new(index: usize, session: &ChatSession) -> Self {
        Self {
            id: index,
            uid: session.id,
            title: session.title.clone(),
            summaries: session.summaries.iter().map(SummaryItemSchema::from).collect(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            meta_summary: session.meta_summary.clone(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SummaryRequest {
    pub session_id: usize,
    pub text: String,
    #[serde(default)]
    pub parameters: Option<ParametersSchema>,
}

#[derive(Deserialize, ToSchema)]
pub struct PartialSummaryRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub parameters: Option<ParametersSchema>,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub session_id: usize,
    pub summary_index: usize,
    pub uid: Uuid,
    pub original_text: String,
    pub summary_text: String,
    pub parameters: ParametersSchema,
    pub created_at: DateTime<Utc>,
}

impl SummaryResponse {
    fn new(session_id: usize, summary_index: usize, item: &SummaryItem) -> Self {
        Self {
            session_id,
            summary_index,
            uid: item.id,
            original_text: item.original_text.clone(),
            summary_text: item.summary_text.clone(),
            parameters: item.parameters.into(),
            created_at: item.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct MetaSummaryRequest {
    pub session_id: usize,
    #[serde(default)]
    pub parameters: Option<ParametersSchema>,
}

#[derive(Serialize, ToSchema)]
pub struct MetaSummaryResponse {
    pub session_id: usize,
    pub title: String,
    pub meta_summary: String,
    pub created_at: DateTime<Utc>,
}

fn session_not_found() -> HttpError {
    HttpError::new(StatusCode::NOT_FOUND, "Chat session not found")
}

fn summary_not_found() -> HttpError {
    HttpError::new(StatusCode::NOT_FOUND, "Summary not found")
}

//=========================================================================================
// Session Handlers
//=========================================================================================

/// POST /chat/sessions - Start a new chat session
#[utoipa::path(
    post,
    path = "/chat/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Chat session created", body = CreateSessionResponse),
        (status = 400, description = "Empty or overlong title", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(mut user): Extension<User>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let index = state.chat.create_session(&mut user, &req.title).await?;
    let uid = user.session(index).map(|s| s.id).ok_or_else(HttpError::internal)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: index,
            uid,
            message: "Chat session created successfully".to_string(),
        }),
    ))
}

/// GET /chat/sessions - All chat sessions of the current user, in order
#[utoipa::path(
    get,
    path = "/chat/sessions",
    responses(
        (status = 200, description = "Chat sessions", body = [ChatSessionResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_sessions_handler(Extension(user): Extension<User>) -> Json<Vec<ChatSessionResponse>> {
    Json(
        user.chat_sessions
            .iter()
            .enumerate()
            .map(|(i, s)| ChatSessionResponse::new(i, s))
            .collect(),
    )
}

/// GET /chat/sessions/{session_id} - One chat session with its summaries
#[utoipa::path(
    get,
    path = "/chat/sessions/{session_id}",
    params(("session_id" = usize, Path, description = "Zero-based session position")),
    responses(
        (status = 200, description = "Chat session", body = ChatSessionResponse),
        (status = 404, description = "Chat session not found", body = ErrorResponse)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(session_id): Path<usize>,
) -> Result<Json<ChatSessionResponse>, HttpError> {
    let session = state
        .chat
        .mutator()
        .get_session(&user, session_id)
        .ok_or_else(session_not_found)?;
    Ok(Json(ChatSessionResponse::new(session_id, session)))
}

/// PATCH /chat/sessions/{session_id}?title= - Rename a chat session
#[utoipa::path(
    patch,
    path = "/chat/sessions/{session_id}",
    params(
        ("session_id" = usize, Path, description = "Zero-based session position"),
        ("title" = String, Query, description = "The new title")
    ),
    responses(
        (status = 200, description = "Renamed chat session", body = ChatSessionResponse),
        (status = 400, description = "Empty or overlong title", body = ErrorResponse),
        (status = 404, description = "Chat session not found", body = ErrorResponse)
    )
)]
pub async fn rename_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(mut user): Extension<User>,
    Path(session_id): Path<usize>,
    Query(query): Query<RenameSessionQuery>,
) -> Result<Json<ChatSessionResponse>, HttpError> {
    let session = state
        .chat
        .rename_session(&mut user, session_id, &query.title)
        .await?;
    Ok(Json(ChatSessionResponse::new(session_id, &session)))
}

/// DELETE /chat/sessions/{session_id} - Delete a chat session; later sessions move up
#[utoipa::path(
    delete,
    path = "/chat/sessions/{session_id}",
    params(("session_id" = usize, Path, description = "Zero-based session position")),
    responses(
        (status = 200, description = "Chat session deleted", body = MessageResponse),
        (status = 404, description = "Chat session not found", body = ErrorResponse)
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(mut user): Extension<User>,
    Path(session_id): Path<usize>,
) -> Result<Json<MessageResponse>, HttpError> {
    state.chat.delete_session(&mut user, session_id).await?;
    Ok(Json(MessageResponse::new("Chat session deleted successfully")))
}

//=========================================================================================
// Summary Handlers
//=========================================================================================

/// POST /chat/summarize - Summarize a text and add it to a chat session
#[utoipa::path(
    post,
    path = "/chat/summarize",
    request_body = SummaryRequest,
    responses(
        (status = 201, description = "Summary added", body = SummaryResponse),
        (status = 400, description = "Text too short or invalid parameters", body = ErrorResponse),
        (status = 404, description = "Chat session not found", body = ErrorResponse),
        (status = 503, description = "Summary service unavailable", body = ErrorResponse)
    )
)]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    Extension(mut user): Extension<User>,
    Json(req): Json<SummaryRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let parameters = req.parameters.map(SummaryParameters::from).unwrap_or_default();
    let (index, _) = state
        .chat
        .add_summary(&mut user, req.session_id, &req.text, parameters)
        .await?;

    let item = state
        .chat
        .mutator()
        .get_summary(&user, req.session_id, index)
        .ok_or_else(HttpError::internal)?;
    Ok((
        StatusCode::CREATED,
        Json(SummaryResponse::new(req.session_id, index, item)),
    ))
}

/// GET /chat/sessions/{session_id}/summaries/{summary_index} - One summary
#[utoipa::path(
    get,
    path = "/chat/sessions/{session_id}/summaries/{summary_index}",
    params(
        ("session_id" = usize, Path, description = "Zero-based session position"),
        ("summary_index" = usize, Path, description = "Zero-based summary position within the session")
    ),
    responses(
        (status = 200, description = "Summary", body = SummaryResponse),
        (status = 404, description = "Summary not found", body = ErrorResponse)
    )
)]
pub async fn get_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path((session_id, summary_index)): Path<(usize, usize)>,
) -> Result<Json<SummaryResponse>, HttpError> {
    let item = state
        .chat
        .mutator()
        .get_summary(&user, session_id, summary_index)
        .ok_or_else(summary_not_found)?;
    Ok(Json(SummaryResponse::new(session_id, summary_index, item)))
}

/// PATCH /chat/sessions/{session_id}/summaries/{summary_index} - Regenerate a summary in place
#[utoipa::path(
    patch,
    path = "/chat/sessions/{session_id}/summaries/{summary_index}",
    request_body = PartialSummaryRequest,
    params(
        ("session_id" = usize, Path, description = "Zero-based session position"),
        ("summary_index" = usize, Path, description = "Zero-based summary position within the session")
    ),
    responses(
        (status = 200, description = "Updated summary", body = SummaryResponse),
        (status = 400, description = "Text too short or invalid parameters", body = ErrorResponse),
        (status = 404, description = "Summary not found", body = ErrorResponse),
        (status = 503, description = "Summary service unavailable", body = ErrorResponse)
    )
)]
pub async fn update_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(mut user): Extension<User>,
    Path((session_id, summary_index)): Path<(usize, usize)>,
    Json(req): Json<PartialSummaryRequest>,
) -> Result<Json<SummaryResponse>, HttpError> {
    let item = state
        .chat
        .update_summary(
            &mut user,
            session_id,
            summary_index,
            req.text.as_deref(),
            req.parameters.map(SummaryParameters::from),
        )
        .await?;
    Ok(Json(SummaryResponse::new(session_id, summary_index, &item)))
}

/// DELETE /chat/sessions/{session_id}/summaries/{summary_index} - Delete a summary
#[utoipa::path(
    delete,
    path = "/chat/sessions/{session_id}/summaries/{summary_index}",
    params(
        ("session_id" = usize, Path, description = "Zero-based session position"),
        ("summary_index" = usize, Path, description = "Zero-based summary position within the session")
    ),
    responses(
        (status = 200, description = "Summary deleted", body = MessageResponse),
        (status = 404, description = "Summary not found", body = ErrorResponse)
    )
)]
pub async fn delete_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(mut user): Extension<User>,
    Path((session_id, summary_index)): Path<(usize, usize)>,
) -> Result<Json<MessageResponse>, HttpError> {
    state
        .chat
        .delete_summary(&mut user, session_id, summary_index)
        .await?;
    Ok(Json(MessageResponse::new("Summary deleted successfully")))
}

/// POST /chat/meta-summarize - Summarize all summaries of a chat session
#[utoipa::path(
    post,
    path = "/chat/meta-summarize",
    request_body = MetaSummaryRequest,
    responses(
        (status = 200, description = "Meta-summary generated and stored", body = MetaSummaryResponse),
        (status = 400, description = "No or too little summary content", body = ErrorResponse),
        (status = 404, description = "Chat session not found", body = ErrorResponse),
        (status = 503, description = "Summary service unavailable", body = ErrorResponse)
    )
)]
pub async fn meta_summarize_handler(
    State(state): State<Arc<AppState>>,
    Extension(mut user): Extension<User>,
    Json(req): Json<MetaSummaryRequest>,
) -> Result<Json<MetaSummaryResponse>, HttpError> {
    let meta_summary = state
        .chat
        .generate_meta_summary(
            &mut user,
            req.session_id,
            req.parameters.map(SummaryParameters::from),
        )
        .await?;

    let title = user
        .session(req.session_id)
        .map(|s| s.title.clone())
        .ok_or_else(session_not_found)?;
    Ok(Json(MetaSummaryResponse {
        session_id: req.session_id,
        title,
        meta_summary,
        created_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_fill_in_defaults() {
        let p: ParametersSchema = serde_json::from_str(r#"{"max_length": 300}"#).unwrap();
        let p = SummaryParameters::from(p);
        assert_eq!(p.min_length, 50);
        assert_eq!(p.max_length, 300);
        assert!(!p.do_sample);
    }

    #[test]
    fn summary_request_parameters_are_optional() {
        let req: SummaryRequest =
            serde_json::from_str(r#"{"session_id": 0, "text": "hello"}"#).unwrap();
        assert!(req.parameters.is_none());
    }
}
