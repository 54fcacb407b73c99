//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{HuggingFaceSummarizer, JwtCredentialStore, PgUserRepository},
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded: {:?}", config);

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let users = Arc::new(PgUserRepository::new(db_pool));
    info!("Running database migrations...");
    users.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let credentials = Arc::new(JwtCredentialStore::new(config.secret_key.as_bytes()));
    let summarizer = Arc::new(HuggingFaceSummarizer::new(
        config.huggingface_api_url.clone(),
        config.hf_token.clone(),
        config.summary_timeout,
    )?);
    if config.hf_token.is_none() {
        tracing::warn!("HF_TOKEN is not set; summarization requests will be sent unauthenticated");
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), users, credentials, summarizer));

    // --- 5. Create the Web Router ---
    let app = build_router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
