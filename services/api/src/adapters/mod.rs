pub mod credentials;
pub mod db;
pub mod summarizer;

pub use credentials::JwtCredentialStore;
pub use db::PgUserRepository;
pub use summarizer::HuggingFaceSummarizer;
