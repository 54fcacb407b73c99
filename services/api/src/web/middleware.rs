//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::{error::HttpError, state::AppState};

/// Name of the cookie that carries the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Returns the value of the named cookie from the request headers, if present.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (key, value) = c.trim().split_once('=')?;
            (key == name && !value.is_empty()).then_some(value)
        })
}

/// Middleware that validates the access token cookie and loads the user it belongs to.
///
/// If valid, inserts the `User` into request extensions for handlers to use.
/// If invalid, expired or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Extract the token from the cookie header
    let token = read_cookie(req.headers(), ACCESS_TOKEN_COOKIE)
        .ok_or_else(|| HttpError::unauthorized("Not authenticated"))?;

    // 2. Verify it and load the user
    let user = state.auth.resolve(token).await.map_err(|e| {
        debug!("Rejected access token: {}", e);
        HttpError::from(e)
    })?;

    // 3. Insert the user into request extensions
    req.extensions_mut().insert(user);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def.ghi; lang=en"),
        );
        assert_eq!(read_cookie(&headers, ACCESS_TOKEN_COOKIE), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn ignores_empty_and_prefixed_names() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("my_access_token=x; access_token="),
        );
        assert_eq!(read_cookie(&headers, ACCESS_TOKEN_COOKIE), None);
    }
}
