//! Argon2id password hashing.
//!
//! Both helpers run on the blocking pool.

use crate::storage::StoreError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use tokio::task;

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hash checked when no stored user carries the submitted username, so a
/// rejected login costs one Argon2 verification either way.
static UNKNOWN_USER_PHC: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"portier-unknown-user", &salt)
        .map(|hash| hash.to_string())
        .ok()
});

#[cfg(test)]
pub(crate) static VERIFICATIONS: AtomicUsize = AtomicUsize::new(0);

fn verify_blocking(password: &[u8], stored: &str) -> bool {
    #[cfg(test)]
    VERIFICATIONS.fetch_add(1, Ordering::SeqCst);

    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default().verify_password(password, &parsed).is_ok()
}

/// Hash a password into a PHC string with a fresh random salt.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash(password: &str) -> Result<String, StoreError> {
    let password = password.to_owned();
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Hash(e.to_string()))
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))?
}

/// Check a password against a stored PHC string.
///
/// A stored value that is not a valid PHC string never matches.
///
/// # Errors
/// Returns an error only if the blocking task panics.
pub async fn verify(password: &str, stored: &str) -> Result<bool, StoreError> {
    let password = password.to_owned();
    let stored = stored.to_owned();
    task::spawn_blocking(move || verify_blocking(password.as_bytes(), &stored))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))
}

/// Spend one verification on a password for which no user exists.
///
/// # Errors
/// Returns an error only if the blocking task panics.
pub async fn verify_unknown_user(password: &str) -> Result<(), StoreError> {
    let password = password.to_owned();
    task::spawn_blocking(move || {
        if let Some(stored) = UNKNOWN_USER_PHC.as_deref() {
            verify_blocking(password.as_bytes(), stored);
        }
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_is_salted_phc() -> Result<(), StoreError> {
        let first = hash("pw1").await?;
        let second = hash("pw1").await?;
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, "pw1");
        assert_ne!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn verify_requires_exact_match() -> Result<(), StoreError> {
        let stored = hash("Secret").await?;
        assert!(verify("Secret", &stored).await?);
        assert!(!verify("secret", &stored).await?);
        assert!(!verify("Secret ", &stored).await?);
        Ok(())
    }

    #[tokio::test]
    async fn verify_rejects_non_phc_values() -> Result<(), StoreError> {
        // legacy plaintext rows must not authenticate
        assert!(!verify("pw1", "pw1").await?);
        assert!(!verify("", "").await?);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_pays_for_a_verification() -> Result<(), StoreError> {
        assert!(UNKNOWN_USER_PHC.as_deref().is_some_and(|phc| phc.starts_with("$argon2id$")));

        let before = VERIFICATIONS.load(Ordering::SeqCst);
        verify_unknown_user("pw1").await?;
        assert!(VERIFICATIONS.load(Ordering::SeqCst) > before);
        Ok(())
    }
}
