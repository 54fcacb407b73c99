pub mod auth;
pub mod chat;
pub mod domain;
pub mod memory;
pub mod mutator;
pub mod ports;

pub use auth::{AuthOrchestrator, UserUpdate};
pub use chat::ChatOrchestrator;
pub use domain::{ChatSession, SummaryItem, SummaryParameters, User};
pub use memory::InMemoryUserRepository;
pub use mutator::{SessionMutator, SummaryPatch};
pub use ports::{
    AuthError, CredentialService, PortError, PortResult, SummarizationService, UserRepository,
};
