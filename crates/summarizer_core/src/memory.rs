//! crates/summarizer_core/src/memory.rs
//!
//! An in-process `UserRepository`. Applies the same versioned-save rules as the
//! database adapter, which makes it a drop-in for tests and local runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::User;
use crate::ports::{PortError, PortResult, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.lock().map(|users| users.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<Uuid, User>>> {
        self.users
            .lock()
            .map_err(|_| PortError::Internal("user store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let users = self.lock()?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut users = self.lock()?;
        if users.values().any(|u| u.email == email) {
            return Err(PortError::Conflict("Email already registered".to_string()));
        }
        let user = User::new(email.to_string(), hashed_password.to_string());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &mut User) -> PortResult<()> {
        let mut users = self.lock()?;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(PortError::Conflict("Email already registered".to_string()));
        }
        let stored = users
            .get_mut(&user.id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user.id)))?;
        if stored.version != user.version {
            return Err(PortError::Conflict(
                "The account was modified by another request; reload and retry".to_string(),
            ));
        }
        user.version += 1;
        *stored = user.clone();
        Ok(())
    }

    async fn delete(&self, user: &User) -> PortResult<bool> {
        let mut users = self.lock()?;
        Ok(users.remove(&user.id).is_some())
    }
}
