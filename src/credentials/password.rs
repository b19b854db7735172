//! Argon2id password hashing. All hashing work runs on the blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;
use tokio::task;

use crate::error::{Error, Result};

fn hash_blocking(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Storage(anyhow::anyhow!("password hashing failed: {e}")))
}

fn verify_blocking(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn join_error(e: task::JoinError) -> Error {
    Error::Storage(anyhow::anyhow!("password task failed: {e}"))
}

/// Hash a password into a PHC string with a fresh random salt.
///
/// # Errors
/// Returns `Storage` if the hasher rejects its parameters or the blocking task dies.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(join_error)?
}

/// Check a password against a stored PHC string. Malformed hashes never match.
///
/// # Errors
/// Returns `Storage` if the blocking task dies.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    task::spawn_blocking(move || verify_blocking(&password, &password_hash))
        .await
        .map_err(join_error)
}

/// Burn the same work as a real verification when the email is unknown, so
/// "no such user" and "wrong password" take comparable time.
///
/// # Errors
/// Returns `Storage` if the blocking task dies.
pub async fn verify_against_dummy(password: &str) -> Result<()> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let password = password.to_owned();
    task::spawn_blocking(move || {
        let dummy = DUMMY_HASH.get_or_init(|| hash_blocking("quizdesk-dummy-password").ok());
        if let Some(hash) = dummy {
            let _ = verify_blocking(&password, hash);
        }
    })
    .await
    .map_err(join_error)
}
