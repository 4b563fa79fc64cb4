use super::{InsertOutcome, StoreError, User, UserStore};
use crate::password;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory [`UserStore`] with the same uniqueness and hashing rules as the
/// `SQLite` adapter. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Inspection helpers read through a poisoned lock instead of hiding its contents.
    fn inspect(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inspect().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the stored users, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<User> {
        self.inspect().clone()
    }

    fn poisoned() -> StoreError {
        StoreError::Task("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let hashed = password::hash(password).await?;

        // Check and push under one lock so concurrent inserts cannot both win.
        let mut users = self.users.lock().map_err(|_| Self::poisoned())?;
        if users.iter().any(|user| user.username == username) {
            return Ok(InsertOutcome::DuplicateUsername);
        }

        let id = users.last().map_or(1, |user| user.id + 1);
        let user = User {
            id,
            username: username.to_string(),
            password: hashed,
        };
        users.push(user.clone());

        Ok(InsertOutcome::Created(user))
    }

    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Vec<User>, StoreError> {
        let candidates: Vec<User> = {
            let users = self.users.lock().map_err(|_| Self::poisoned())?;
            users
                .iter()
                .filter(|user| user.username == username)
                .cloned()
                .collect()
        };

        if candidates.is_empty() {
            password::verify_unknown_user(password).await?;
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for user in candidates {
            if password::verify(password, &user.password).await? {
                matches.push(user);
            }
        }

        Ok(matches)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.users.lock().map(|_| ()).map_err(|_| Self::poisoned())
    }
}
