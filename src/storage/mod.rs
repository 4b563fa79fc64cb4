//! User persistence port.
//!
//! The gateway only talks to storage through [`UserStore`], so the `SQLite`
//! adapter can be swapped for [`MemoryUserStore`] in tests.

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod sqlite;

pub use self::memory::MemoryUserStore;
pub use self::sqlite::{SqliteUserStore, is_unique_violation};

/// A stored user. `password` holds the Argon2 PHC string, never the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Result of an insert attempt that did not fail unexpectedly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(User),
    DuplicateUsername,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("blocking task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Hash `password` and insert a new user.
    ///
    /// # Errors
    /// Returns an error for any failure other than a duplicate username.
    async fn insert_user(&self, username: &str, password: &str)
    -> Result<InsertOutcome, StoreError>;

    /// Return every user whose username and password both match exactly.
    ///
    /// # Errors
    /// Returns an error if the lookup itself fails.
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Vec<User>, StoreError>;

    /// Check the backing store is reachable.
    ///
    /// # Errors
    /// Returns an error if no connection can be used.
    async fn ping(&self) -> Result<(), StoreError>;
}
