//! services/api/src/adapters/credentials.rs
//!
//! Password hashing with Argon2 and HS256-signed access tokens. This adapter is the
//! only holder of the signing secret and implements the `CredentialService` port.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use summarizer_core::ports::{AuthError, CredentialService, PortError, PortResult};
use tracing::error;

/// The claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtCredentialStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtCredentialStore {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Signs a token as if it were issued at `now`.
    pub fn issue_token_at(&self, subject: &str, ttl: Duration, now: DateTime<Utc>) -> PortResult<String> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            error!("Access token lifetime {} overflows the clock", ttl);
            PortError::Internal("Failed to issue access token".to_string())
        })?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign access token: {:?}", e);
            PortError::Internal("Failed to issue access token".to_string())
        })
    }

    /// Verifies a token against the clock reading `now`.
    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock.
        validation.validate_exp = false;
        validation.required_spec_claims = ["exp", "sub"].into_iter().map(String::from).collect();

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::Invalid)?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::Invalid);
        }
        if now.timestamp() >= data.claims.exp {
            return Err(AuthError::Expired);
        }
        Ok(data.claims.sub)
    }
}

impl CredentialService for JwtCredentialStore {
    fn hash_password(&self, password: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::Internal("Failed to hash password".to_string())
            })
    }

    fn verify_password(&self, password: &str, hashed_password: &str) -> bool {
        match PasswordHash::new(hashed_password) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                error!("Failed to parse password hash: {:?}", e);
                false
            }
        }
    }

    fn issue_token(&self, subject: &str, ttl: Duration) -> PortResult<String> {
        self.issue_token_at(subject, ttl, Utc::now())
    }

    fn verify_token(&self, token: &str) -> Result<String, AuthError> {
        self.verify_token_at(token, Utc::now())
    }
}
