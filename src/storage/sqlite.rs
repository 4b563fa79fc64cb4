use super::{InsertOutcome, StoreError, User, UserStore};
use crate::password;
use async_trait::async_trait;
use sqlx::{
    Connection, Row,
    error::ErrorKind,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::str::FromStr;
use tracing::{Instrument, debug, info_span};

const CREATE_USERS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
";

/// `SQLite`-backed [`UserStore`].
///
/// Every call runs on a connection borrowed from the pool for that call only.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Open (or create) the database at `dsn` and make sure the schema exists.
    ///
    /// In-memory databases are private to one connection, so use
    /// `max_connections = 1` with `sqlite::memory:`.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid, the database cannot be opened or the
    /// schema cannot be created.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections.max(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool, creating the `users` table if absent.
    ///
    /// # Errors
    /// Returns an error if the schema statement fails.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "CREATE",
            db.statement = CREATE_USERS_TABLE
        );
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&pool)
            .instrument(span)
            .await?;

        debug!("users table ready");

        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// True when the database rejected a write because of a `UNIQUE` constraint.
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(db_err.kind(), ErrorKind::UniqueViolation),
        _ => false,
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn insert_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let hashed = password::hash(password).await?;

        let query = "INSERT INTO users (username, password) VALUES (?1, ?2)";
        let span = info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "INSERT",
            db.statement = query
        );
        match sqlx::query(query)
            .bind(username)
            .bind(&hashed)
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            Ok(result) => Ok(InsertOutcome::Created(User {
                id: result.last_insert_rowid(),
                username: username.to_string(),
                password: hashed,
            })),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::DuplicateUsername),
            Err(err) => Err(StoreError::Database(err)),
        }
    }

    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Vec<User>, StoreError> {
        let query = "SELECT id, username, password FROM users WHERE username = ?1";
        let span = info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(username)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        if rows.is_empty() {
            password::verify_unknown_user(password).await?;
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for row in rows {
            let user = User {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                password: row.try_get("password")?,
            };
            if password::verify(password, &user.password).await? {
                matches.push(user);
            }
        }

        Ok(matches)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!("db.acquire", db.system = "sqlite", db.operation = "ACQUIRE");
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "sqlite", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::DatabaseError;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;
    use std::sync::atomic::Ordering;

    async fn memory_store() -> Result<SqliteUserStore, StoreError> {
        SqliteUserStore::connect("sqlite::memory:", 1).await
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() -> Result<(), StoreError> {
        let store = memory_store().await?;
        let again = SqliteUserStore::with_pool(store.pool().clone()).await;
        assert!(again.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_hashes_password() -> Result<(), StoreError> {
        let store = memory_store().await?;

        let InsertOutcome::Created(alice) = store.insert_user("alice", "pw1").await? else {
            panic!("alice should be created");
        };
        let InsertOutcome::Created(bob) = store.insert_user("bob", "pw1").await? else {
            panic!("bob should be created");
        };

        assert_ne!(alice.id, bob.id);
        assert_eq!(alice.username, "alice");

        let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE username = ?1")
            .bind("alice")
            .fetch_one(store.pool())
            .await?;
        assert_ne!(stored, "pw1");
        assert!(stored.starts_with("$argon2id$"));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_is_a_tagged_outcome() -> Result<(), StoreError> {
        let store = memory_store().await?;
        store.insert_user("alice", "pw1").await?;

        let outcome = store.insert_user("alice", "pw2").await?;
        assert_eq!(outcome, InsertOutcome::DuplicateUsername);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind("alice")
            .fetch_one(store.pool())
            .await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() -> Result<(), StoreError> {
        let store = memory_store().await?;
        store.insert_user("alice", "pw1").await?;

        let outcome = store.insert_user("Alice", "pw1").await?;
        assert!(matches!(outcome, InsertOutcome::Created(_)));
        assert!(store.find_user_by_credentials("ALICE", "pw1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn find_requires_both_fields() -> Result<(), StoreError> {
        let store = memory_store().await?;
        store.insert_user("alice", "pw1").await?;

        let found = store.find_user_by_credentials("alice", "pw1").await?;
        assert_eq!(found.len(), 1);
        assert!(store.find_user_by_credentials("alice", "wrong").await?.is_empty());
        assert!(store.find_user_by_credentials("nobody", "pw1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_username_still_verifies() -> Result<(), StoreError> {
        let store = memory_store().await?;
        store.insert_user("alice", "pw1").await?;

        let before = password::VERIFICATIONS.load(Ordering::SeqCst);
        assert!(store.find_user_by_credentials("nobody", "pw1").await?.is_empty());
        assert!(password::VERIFICATIONS.load(Ordering::SeqCst) > before);
        Ok(())
    }

    #[tokio::test]
    async fn plaintext_rows_never_match() -> Result<(), StoreError> {
        let store = memory_store().await?;
        sqlx::query("INSERT INTO users (username, password) VALUES (?1, ?2)")
            .bind("legacy")
            .bind("pw1")
            .execute(store.pool())
            .await?;

        assert!(store.find_user_by_credentials("legacy", "pw1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_pool() -> Result<(), StoreError> {
        let store = memory_store().await?;
        store.ping().await
    }

    #[tokio::test]
    async fn ping_fails_on_closed_pool() -> Result<(), StoreError> {
        let store = memory_store().await?;
        store.pool().close().await;
        assert!(store.ping().await.is_err());
        Ok(())
    }

    #[derive(Debug)]
    struct TestDbError {
        kind: fn() -> ErrorKind,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            (self.kind)()
        }
    }

    #[test]
    fn is_unique_violation_matches_kind() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            kind: || ErrorKind::UniqueViolation,
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            kind: || ErrorKind::NotNullViolation,
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
