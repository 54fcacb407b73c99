//! services/api/src/web/auth.rs
//!
//! Account endpoints: registration, login, logout and the current user's profile.
//! The access token travels only in the http-only `access_token` cookie.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use summarizer_core::{User, UserUpdate};
use tracing::error;
use utoipa::ToSchema;

use crate::web::{
    error::{ErrorResponse, HttpError},
    middleware::ACCESS_TOKEN_COOKIE,
    rest::MessageResponse,
    state::AppState,
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub message: String,
}

//=========================================================================================
// Cookie Helpers
//=========================================================================================

fn access_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ACCESS_TOKEN_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn session_cookie(state: &AppState, token: &str) -> String {
    access_cookie(
        token,
        state.auth.token_ttl().num_seconds(),
        state.config.is_production(),
    )
}

fn cleared_cookie(state: &AppState) -> String {
    access_cookie("", 0, state.config.is_production())
}

fn set_cookie(response: &mut Response, cookie: String) -> Result<(), HttpError> {
    let value = HeaderValue::from_str(&cookie).map_err(|e| {
        error!("Failed to build cookie header: {:?}", e);
        HttpError::internal()
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account and log it in
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created and logged in", body = UserResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, HttpError> {
    let (user, token) = state.auth.register(&req.email, &req.password).await?;

    let mut response = (
        StatusCode::CREATED,
        Json(UserResponse {
            email: user.email,
            message: "User created and logged in successfully".to_string(),
        }),
    )
        .into_response();
    set_cookie(&mut response, session_cookie(&state, &token))?;
    Ok(response)
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, HttpError> {
    let (user, token) = state.auth.authenticate(&req.email, &req.password).await?;

    let mut response = Json(UserResponse {
        email: user.email,
        message: "Login successful".to_string(),
    })
    .into_response();
    set_cookie(&mut response, session_cookie(&state, &token))?;
    Ok(response)
}

/// POST /auth/logout - Clear the access token cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse)
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> Result<Response, HttpError> {
    let mut response = Json(MessageResponse::new("Logged out successfully")).into_response();
    set_cookie(&mut response, cleared_cookie(&state))?;
    Ok(response)
}

/// GET /auth/me - The currently logged-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse {
        email: user.email,
        message: "User information retrieved successfully".to_string(),
    })
}

/// PATCH /auth/me - Change the current user's email, password or active flag
///
/// A changed email invalidates the old token, so a fresh cookie is issued.
#[utoipa::path(
    patch,
    path = "/auth/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "No valid update data provided", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 409, description = "Email already registered or concurrent modification", body = ErrorResponse)
    )
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Response, HttpError> {
    let previous_email = user.email.clone();
    let update = UserUpdate {
        email: req.email,
        password: req.password,
        is_active: req.is_active,
    };
    let updated = state.auth.update(user, update).await?;

    let fresh_token = if updated.email != previous_email {
        Some(state.auth.issue_token(&updated.email)?)
    } else {
        None
    };

    let mut response = Json(UserResponse {
        email: updated.email,
        message: "User updated successfully".to_string(),
    })
    .into_response();
    if let Some(token) = fresh_token {
        set_cookie(&mut response, session_cookie(&state, &token))?;
    }
    Ok(response)
}

/// DELETE /auth/me - Delete the account with all of its chat sessions
#[utoipa::path(
    delete,
    path = "/auth/me",
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn delete_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Response, HttpError> {
    state.auth.delete(&user).await?;

    let mut response = Json(MessageResponse::new("User deleted successfully")).into_response();
    set_cookie(&mut response, cleared_cookie(&state))?;
    Ok(response)
}
