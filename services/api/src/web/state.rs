//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use summarizer_core::{
    ports::{CredentialService, SummarizationService, UserRepository},
    AuthOrchestrator, ChatOrchestrator,
};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthOrchestrator,
    pub chat: ChatOrchestrator,
}

impl AppState {
    /// Wires the orchestrators to the given adapters.
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserRepository>,
        credentials: Arc<dyn CredentialService>,
        summarizer: Arc<dyn SummarizationService>,
    ) -> Self {
        let auth = AuthOrchestrator::new(users.clone(), credentials, config.access_token_ttl);
        let chat = ChatOrchestrator::new(users, summarizer);
        Self { config, auth, chat }
    }
}
