//! Argon2 password hashing.
//!
//! Hashes are PHC strings carrying their own salt and parameters, so
//! verification needs nothing beyond the stored value.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use tracing::{debug, error};

use crate::errors::ServiceError;

/// Hash verified when the account does not exist, so that unknown names and
/// wrong passwords take the same time to reject.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("inventario-dummy-password").ok());

/// Hashes `password` with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    if password.is_empty() {
        return Err(ServiceError::ValidationError(
            "password cannot be empty".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Argon2 password hashing failed");
            ServiceError::HashError(e.to_string())
        })
}

/// Constant-time comparison of `password` against a stored PHC string.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Burns one verification against a fixed hash. Always returns `false`.
pub fn verify_dummy(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(hash, password);
    } else {
        debug!("dummy hash unavailable, skipping timing equalization");
    }
    false
}

/// Runs [`hash_password`] off the async executor
pub async fn hash_password_blocking(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::InternalError(format!("hashing task failed: {e}")))?
}
