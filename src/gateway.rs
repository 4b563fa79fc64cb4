//! Register, login and home decisions.
//!
//! The gateway never sees HTTP. Each operation answers with a [`Transition`]: the
//! page the caller goes to next and the one-shot status to show there.

use crate::storage::{InsertOutcome, StoreError, UserStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const MSG_REGISTERED: &str = "Registered successfully! Please login.";
pub const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match!";
pub const MSG_USERNAME_TAKEN: &str = "Username already exists";
pub const MSG_LOGGED_IN: &str = "Logged in successfully!";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const MSG_UNEXPECTED: &str = "Something went wrong, please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    Home,
}

impl Page {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Home => "/home",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Danger,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
        }
    }
}

/// A one-shot, human-readable message for the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub category: Category,
    pub message: String,
}

impl Status {
    #[must_use]
    pub fn success(message: &str) -> Self {
        Self {
            category: Category::Success,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn danger(message: &str) -> Self {
        Self {
            category: Category::Danger,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: Page,
    pub status: Option<Status>,
}

impl Transition {
    fn to(target: Page, status: Status) -> Self {
        Self {
            target,
            status: Some(status),
        }
    }
}

pub struct Gateway {
    store: Arc<dyn UserStore>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create an account when both password fields agree.
    ///
    /// # Errors
    /// Returns the storage error for any failure other than a duplicate username.
    #[instrument(skip(self, password, confirm_password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Transition, StoreError> {
        if password != confirm_password {
            return Ok(Transition::to(
                Page::Register,
                Status::danger(MSG_PASSWORD_MISMATCH),
            ));
        }

        match self.store.insert_user(username, password).await? {
            InsertOutcome::Created(user) => {
                info!(user.id = user.id, "user registered");
                Ok(Transition::to(Page::Login, Status::success(MSG_REGISTERED)))
            }
            InsertOutcome::DuplicateUsername => Ok(Transition::to(
                Page::Register,
                Status::danger(MSG_USERNAME_TAKEN),
            )),
        }
    }

    /// Authenticate an exact username and password pair.
    ///
    /// Exactly one matching record is required; anything else is rejected with the
    /// same status so callers cannot tell which field was wrong.
    ///
    /// # Errors
    /// Returns the storage error if the lookup fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Transition, StoreError> {
        let matches = self
            .store
            .find_user_by_credentials(username, password)
            .await?;

        match matches.as_slice() {
            [user] => {
                info!(user.id = user.id, "user logged in");
                Ok(Transition::to(Page::Home, Status::success(MSG_LOGGED_IN)))
            }
            [] => Ok(Transition::to(
                Page::Login,
                Status::danger(MSG_INVALID_CREDENTIALS),
            )),
            many => {
                warn!(count = many.len(), "multiple users matched one credential pair");
                Ok(Transition::to(
                    Page::Login,
                    Status::danger(MSG_INVALID_CREDENTIALS),
                ))
            }
        }
    }

    #[must_use]
    pub const fn home(&self) -> Transition {
        Transition {
            target: Page::Home,
            status: None,
        }
    }

    /// Check the store is reachable.
    ///
    /// # Errors
    /// Returns the storage error when it is not.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryUserStore, User};
    use async_trait::async_trait;

    fn gateway() -> (Gateway, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        (Gateway::new(store.clone()), store)
    }

    #[tokio::test]
    async fn register_then_login_reaches_home() -> Result<(), StoreError> {
        let (gateway, _) = gateway();

        let registered = gateway.register("alice", "pw1", "pw1").await?;
        assert_eq!(registered.target, Page::Login);
        assert_eq!(registered.status, Some(Status::success(MSG_REGISTERED)));

        let logged_in = gateway.login("alice", "pw1").await?;
        assert_eq!(logged_in.target, Page::Home);
        assert_eq!(logged_in.status, Some(Status::success(MSG_LOGGED_IN)));
        Ok(())
    }

    #[tokio::test]
    async fn password_mismatch_never_touches_storage() -> Result<(), StoreError> {
        let (gateway, store) = gateway();

        for _ in 0..3 {
            let transition = gateway.register("alice", "pw1", "pw2").await?;
            assert_eq!(transition.target, Page::Register);
            assert_eq!(
                transition.status,
                Some(Status::danger(MSG_PASSWORD_MISMATCH))
            );
        }

        assert!(store.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() -> Result<(), StoreError> {
        let (gateway, store) = gateway();

        gateway.register("alice", "pw1", "pw1").await?;
        let second = gateway.register("alice", "pw2", "pw2").await?;

        assert_eq!(second.target, Page::Register);
        assert_eq!(second.status, Some(Status::danger(MSG_USERNAME_TAKEN)));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() -> Result<(), StoreError> {
        let (gateway, _) = gateway();
        gateway.register("alice", "pw1", "pw1").await?;

        let wrong_password = gateway.login("alice", "wrong").await?;
        let unknown_user = gateway.login("mallory", "pw1").await?;

        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.target, Page::Login);
        assert_eq!(
            wrong_password.status,
            Some(Status::danger(MSG_INVALID_CREDENTIALS))
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_login_is_repeatable_without_side_effects() -> Result<(), StoreError> {
        let (gateway, store) = gateway();
        gateway.register("alice", "pw1", "pw1").await?;
        let before = store.snapshot();

        let first = gateway.login("alice", "nope").await?;
        for _ in 0..3 {
            assert_eq!(gateway.login("alice", "nope").await?, first);
        }

        assert_eq!(store.snapshot(), before);
        Ok(())
    }

    #[tokio::test]
    async fn home_always_lands_without_status() {
        let (gateway, _) = gateway();
        let transition = gateway.home();
        assert_eq!(transition.target, Page::Home);
        assert_eq!(transition.status, None);
    }

    struct DuplicatedRowsStore;

    #[async_trait]
    impl UserStore for DuplicatedRowsStore {
        async fn insert_user(&self, _: &str, _: &str) -> Result<InsertOutcome, StoreError> {
            Ok(InsertOutcome::DuplicateUsername)
        }

        async fn find_user_by_credentials(
            &self,
            username: &str,
            _: &str,
        ) -> Result<Vec<User>, StoreError> {
            let user = |id| User {
                id,
                username: username.to_string(),
                password: String::new(),
            };
            Ok(vec![user(1), user(2)])
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn multiple_matches_fail_closed() -> Result<(), StoreError> {
        let gateway = Gateway::new(Arc::new(DuplicatedRowsStore));
        let transition = gateway.login("alice", "pw1").await?;
        assert_eq!(transition.target, Page::Login);
        assert_eq!(
            transition.status,
            Some(Status::danger(MSG_INVALID_CREDENTIALS))
        );
        Ok(())
    }

    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn insert_user(&self, _: &str, _: &str) -> Result<InsertOutcome, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn find_user_by_credentials(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<User>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn unexpected_storage_failures_propagate() {
        let gateway = Gateway::new(Arc::new(BrokenStore));
        assert!(gateway.register("alice", "pw1", "pw1").await.is_err());
        assert!(gateway.login("alice", "pw1").await.is_err());
        assert!(gateway.ping().await.is_err());

        // mismatch is decided before storage is reached
        assert!(gateway.register("alice", "pw1", "pw2").await.is_ok());
    }
}
