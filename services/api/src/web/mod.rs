pub mod auth;
pub mod chat;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod state;

// Re-export the pieces the binaries need to assemble the server.
pub use error::HttpError;
pub use middleware::require_auth;
pub use router::build_router;
pub use state::AppState;
