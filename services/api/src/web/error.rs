//! services/api/src/web/error.rs
//!
//! Renders core failures as HTTP responses: a status code plus a human-readable
//! `detail` message. Internal detail is logged, never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use summarizer_core::ports::PortError;
use tracing::error;
use utoipa::ToSchema;

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<PortError> for HttpError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::InvalidInput(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            PortError::Unauthorized(msg) => Self::new(StatusCode::UNAUTHORIZED, msg),
            PortError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            PortError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            PortError::ServiceUnavailable(msg) => {
                error!("Summarization unavailable: {}", msg);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Summary service temporarily unavailable",
                )
            }
            PortError::Internal(msg) => {
                error!("Internal error: {}", msg);
                Self::internal()
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_port_errors_to_status_codes() {
        let cases = [
            (PortError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (PortError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (PortError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PortError::Conflict("x".into()), StatusCode::CONFLICT),
            (PortError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (PortError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(HttpError::from(err).status, status);
        }
    }

    #[test]
    fn hides_internal_detail() {
        let err = HttpError::from(PortError::Internal("pool timed out on 10.0.0.3".into()));
        assert_eq!(err.message, "Internal server error");

        let err = HttpError::from(PortError::ServiceUnavailable("dns error: api-inference".into()));
        assert_eq!(err.message, "Summary service temporarily unavailable");
    }
}
