//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. The resulting `Config` is passed explicitly
//! to the components that need it.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_HUGGINGFACE_API_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";

/// Shortest accepted `SECRET_KEY`, in bytes.
pub const MIN_SECRET_KEY_BYTES: usize = 32;

/// Longest accepted access token lifetime: one year.
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 365 * 24 * 60;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub secret_key: String,
    pub access_token_ttl: chrono::Duration,
    pub hf_token: Option<String>,
    pub huggingface_api_url: String,
    pub summary_timeout: Duration,
    pub environment: String,
    pub allowed_origins: Vec<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("log_level", &self.log_level)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("huggingface_api_url", &self.huggingface_api_url)
            .field("summary_timeout", &self.summary_timeout)
            .field("environment", &self.environment)
            .field("allowed_origins", &self.allowed_origins)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Token Settings ---
        let secret_key =
            lookup("SECRET_KEY").ok_or_else(|| ConfigError::MissingVar("SECRET_KEY".to_string()))?;
        if secret_key.len() < MIN_SECRET_KEY_BYTES {
            return Err(ConfigError::InvalidValue(
                "SECRET_KEY".to_string(),
                format!("must be at least {} bytes long", MIN_SECRET_KEY_BYTES),
            ));
        }

        let ttl_minutes: i64 = parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", &lookup, 30)?;
        if !(1..=MAX_ACCESS_TOKEN_MINUTES).contains(&ttl_minutes) {
            return Err(ConfigError::InvalidValue(
                "ACCESS_TOKEN_EXPIRE_MINUTES".to_string(),
                format!("must be between 1 and {}", MAX_ACCESS_TOKEN_MINUTES),
            ));
        }

        // --- Load Summarization Settings ---
        let hf_token = lookup("HF_TOKEN").filter(|t| !t.trim().is_empty());
        let huggingface_api_url =
            lookup("HUGGINGFACE_API_URL").unwrap_or_else(|| DEFAULT_HUGGINGFACE_API_URL.to_string());
        let timeout_secs: u64 = parse_or("SUMMARY_TIMEOUT_SECS", &lookup, 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SUMMARY_TIMEOUT_SECS".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Load Deployment Settings ---
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:8000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            secret_key,
            access_token_ttl: chrono::Duration::minutes(ttl_minutes),
            hf_token,
            huggingface_api_url,
            summary_timeout: Duration::from_secs(timeout_secs),
            environment,
            allowed_origins,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
