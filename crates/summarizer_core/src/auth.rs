//! crates/summarizer_core/src/auth.rs
//!
//! Account use cases: registration, login, profile updates and deletion, and
//! resolving an access token back to its user.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::domain::{canonical_email, normalize_email, validate_password, User};
use crate::ports::{CredentialService, PortError, PortResult, UserRepository};

/// The profile fields a user may change. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.is_active.is_none()
    }
}

/// Hashed once at startup so that logins for unknown emails pay the same verification cost.
const DECOY_PASSWORD: &str = "decoy-password-never-assigned";

pub struct AuthOrchestrator {
    users: Arc<dyn UserRepository>,
    credentials: Arc<dyn CredentialService>,
    token_ttl: Duration,
    decoy_hash: Option<String>,
}

impl AuthOrchestrator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        credentials: Arc<dyn CredentialService>,
        token_ttl: Duration,
    ) -> Self {
        let decoy_hash = credentials.hash_password(DECOY_PASSWORD).ok();
        if decoy_hash.is_none() {
            warn!("Could not prepare the decoy password hash");
        }
        Self {
            users,
            credentials,
            token_ttl,
            decoy_hash,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn issue_token(&self, subject: &str) -> PortResult<String> {
        self.credentials.issue_token(subject, self.token_ttl)
    }

    /// Creates an account and returns it together with a fresh access token.
    pub async fn register(&self, email: &str, password: &str) -> PortResult<(User, String)> {
        let email = normalize_email(email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let hashed_password = self.credentials.hash_password(password)?;
        let user = self.users.create(&email, &hashed_password).await?;
        let token = self.issue_token(&user.email)?;
        info!(user_id = %user.id, "Registered new user");
        Ok((user, token))
    }

    /// Checks the credentials and returns the user with a fresh access token.
    ///
    /// Unknown email, wrong password and deactivated account are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> PortResult<(User, String)> {
        let found = self.users.find_by_email(&canonical_email(email)).await?;
        let verified = match (&found, &self.decoy_hash) {
            (Some(user), _) => self.credentials.verify_password(password, &user.hashed_password),
            (None, Some(decoy)) => {
                self.credentials.verify_password(password, decoy);
                false
            }
            (None, None) => false,
        };
        let user = found
            .filter(|u| verified && u.is_active)
            .ok_or_else(|| {
                warn!("Rejected login attempt");
                PortError::Unauthorized("Incorrect email or password".to_string())
            })?;

        let token = self.issue_token(&user.email)?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    /// Loads the active user a token was issued to.
    pub async fn resolve(&self, token: &str) -> PortResult<User> {
        let email = self.credentials.verify_token(token)?;
        match self.users.find_by_email(&email).await? {
            Some(user) if user.is_active => Ok(user),
            Some(_) => Err(PortError::Unauthorized("Account is deactivated".to_string())),
            None => Err(PortError::Unauthorized("User not found".to_string())),
        }
    }

    pub async fn update(&self, mut user: User, update: UserUpdate) -> PortResult<User> {
        if update.is_empty() {
            return Err(PortError::InvalidInput("No valid update data provided".to_string()));
        }

        if let Some(email) = update.email {
            let email = normalize_email(&email)?;
            if email != user.email {
                if self.users.find_by_email(&email).await?.is_some() {
                    return Err(email_taken());
                }
                user.email = email;
            }
        }
        if let Some(password) = update.password {
            validate_password(&password)?;
            user.hashed_password = self.credentials.hash_password(&password)?;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }

        self.users.save(&mut user).await?;
        info!(user_id = %user.id, "Updated user profile");
        Ok(user)
    }

    /// Deletes the account together with all of its sessions and summaries.
    pub async fn delete(&self, user: &User) -> PortResult<bool> {
        let deleted = self.users.delete(user).await?;
        info!(user_id = %user.id, deleted, "Deleted user");
        Ok(deleted)
    }
}

fn email_taken() -> PortError {
    PortError::Conflict("Email already registered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryUserRepository;
    use crate::ports::AuthError;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reversible stand-ins, good enough to exercise the orchestration.
    #[derive(Default)]
    struct PlainCredentials {
        verifications: AtomicUsize,
    }

    impl CredentialService for PlainCredentials {
        fn hash_password(&self, password: &str) -> PortResult<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify_password(&self, password: &str, hashed_password: &str) -> bool {
            self.verifications.fetch_add(1, Ordering::SeqCst);
            hashed_password.strip_prefix("hashed:") == Some(password)
        }

        fn issue_token(&self, subject: &str, ttl: Duration) -> PortResult<String> {
            Ok(format!("{}|{}", subject, (Utc::now() + ttl).timestamp()))
        }

        fn verify_token(&self, token: &str) -> Result<String, AuthError> {
            let (subject, exp) = token.split_once('|').ok_or(AuthError::Invalid)?;
            let exp: i64 = exp.parse().map_err(|_| AuthError::Invalid)?;
            if Utc::now().timestamp() >= exp {
                return Err(AuthError::Expired);
            }
            Ok(subject.to_string())
        }
    }

    fn auth() -> (AuthOrchestrator, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let auth = AuthOrchestrator::new(repo.clone(), Arc::new(PlainCredentials::default()), Duration::minutes(30));
        (auth, repo)
    }

    #[tokio::test]
    async fn register_hashes_and_issues_token() {
        let (auth, _) = auth();
        let (user, token) = auth.register("a@example.com", "password1").await.unwrap();
        assert_eq!(user.hashed_password, "hashed:password1");
        assert!(user.is_active);
        assert_eq!(auth.resolve(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (auth, repo) = auth();
        auth.register("a@example.com", "password1").await.unwrap();
        let err = auth.register("a@example.com", "password2").await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (auth, repo) = auth();
        assert!(matches!(
            auth.register("not-an-email", "password1").await,
            Err(PortError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("a@example.com", "short").await,
            Err(PortError::InvalidInput(_))
        ));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (auth, _) = auth();
        auth.register("a@example.com", "password1").await.unwrap();

        let wrong_password = auth.authenticate("a@example.com", "password2").await.unwrap_err();
        let unknown_email = auth.authenticate("b@example.com", "password1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, PortError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_email_still_runs_a_password_check() {
        let credentials = Arc::new(PlainCredentials::default());
        let auth = AuthOrchestrator::new(
            Arc::new(InMemoryUserRepository::new()),
            credentials.clone(),
            Duration::minutes(30),
        );

        assert!(auth.authenticate("ghost@example.com", "password1").await.is_err());
        assert_eq!(credentials.verifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn email_domain_is_case_insensitive() {
        let (auth, repo) = auth();
        auth.register("Ann@Example.com", "password1").await.unwrap();

        let err = auth.register("Ann@EXAMPLE.com", "password2").await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
        assert_eq!(repo.len(), 1);

        let (user, _) = auth.authenticate("Ann@example.COM", "password1").await.unwrap();
        assert_eq!(user.email, "Ann@example.com");
    }

    #[tokio::test]
    async fn deactivated_users_cannot_log_in() {
        let (auth, _) = auth();
        let (user, token) = auth.register("a@example.com", "password1").await.unwrap();
        auth.update(
            user,
            UserUpdate {
                is_active: Some(false),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            auth.authenticate("a@example.com", "password1").await,
            Err(PortError::Unauthorized(_))
        ));
        assert!(matches!(auth.resolve(&token).await, Err(PortError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn update_rehashes_password_and_changes_email() {
        let (auth, _) = auth();
        let (user, _) = auth.register("a@example.com", "password1").await.unwrap();

        let updated = auth
            .update(
                user,
                UserUpdate {
                    email: Some("new@example.com".to_string()),
                    password: Some("password2".to_string()),
                    is_active: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert!(auth.authenticate("new@example.com", "password2").await.is_ok());
        assert!(auth.authenticate("a@example.com", "password1").await.is_err());
    }

    #[tokio::test]
    async fn update_rejects_taken_email_and_empty_update() {
        let (auth, _) = auth();
        auth.register("a@example.com", "password1").await.unwrap();
        let (b, _) = auth.register("b@example.com", "password1").await.unwrap();

        assert!(matches!(
            auth.update(b.clone(), UserUpdate::default()).await,
            Err(PortError::InvalidInput(_))
        ));
        let err = auth
            .update(
                b,
                UserUpdate {
                    email: Some("a@example.com".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_cascades() {
        let (auth, repo) = auth();
        let (user, token) = auth.register("a@example.com", "password1").await.unwrap();
        assert!(auth.delete(&user).await.unwrap());
        assert!(repo.is_empty());
        assert!(matches!(auth.resolve(&token).await, Err(PortError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let auth = AuthOrchestrator::new(repo, Arc::new(PlainCredentials::default()), Duration::seconds(-1));
        let (_, token) = auth.register("a@example.com", "password1").await.unwrap();
        assert!(matches!(auth.resolve(&token).await, Err(PortError::Unauthorized(_))));
    }
}
