//! crates/summarizer_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::{SummaryParameters, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and orchestrator operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("An internal error occurred: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Why a presented access token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

impl From<AuthError> for PortError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Invalid => PortError::Unauthorized("Could not validate credentials".to_string()),
            AuthError::Expired => PortError::Unauthorized("Session expired".to_string()),
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence of the `User` aggregate. The whole aggregate is read and written as one unit.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<User>>;

    /// Inserts a new user. Fails with `Conflict` if the email is already taken.
    async fn create(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    /// Writes the full aggregate back, provided nobody else saved it since it was loaded.
    ///
    /// On success `user.version` is advanced to the stored version. A stale version,
    /// or an email that collides with another user, fails with `Conflict`.
    async fn save(&self, user: &mut User) -> PortResult<()>;

    /// Removes the user and everything it owns. Returns `false` if it was already gone.
    async fn delete(&self, user: &User) -> PortResult<bool>;
}

#[async_trait]
pub trait SummarizationService: Send + Sync {
    /// Summarizes `text` with the given generation parameters.
    ///
    /// Any failure to obtain a summary is reported as `PortError::ServiceUnavailable`.
    async fn summarize(&self, text: &str, parameters: &SummaryParameters) -> PortResult<String>;
}

/// Password hashing and signed-token handling. Implementations hold the signing secret.
pub trait CredentialService: Send + Sync {
    fn hash_password(&self, password: &str) -> PortResult<String>;

    fn verify_password(&self, password: &str, hashed_password: &str) -> bool;

    /// Signs a token for `subject` valid for `ttl`.
    fn issue_token(&self, subject: &str, ttl: Duration) -> PortResult<String>;

    /// Returns the subject carried by a valid, unexpired token.
    fn verify_token(&self, token: &str) -> Result<String, AuthError>;
}
