//! Cookie sessions. The raw token only ever lives in the cookie; the
//! database stores its SHA-256.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, Instrument};
use uuid::Uuid;

use super::{query_span, user_from_row, CredentialStore, UserRecord};
use crate::error::{Error, Result};

/// Create a new random session token for the auth cookie.
///
/// # Errors
/// Returns `Storage` if the OS random source fails.
pub fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Storage(anyhow::anyhow!("failed to generate session token: {e}")))?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

#[must_use]
pub fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

impl CredentialStore {
    /// Open a session for `user_id` and return the raw token for the cookie.
    ///
    /// # Errors
    /// Returns `Storage` if the insert keeps colliding or the database fails.
    pub async fn create_session(&self, user_id: Uuid, ttl_seconds: i64) -> Result<String> {
        let query = r"
            INSERT INTO sessions (session_hash, user_id, expires_at)
            VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) + ?3)
        ";

        for _ in 0..3 {
            let token = generate_session_token()?;
            let result = sqlx::query(query)
                .bind(hash_session_token(&token))
                .bind(user_id)
                .bind(ttl_seconds)
                .execute(self.pool())
                .instrument(query_span("INSERT", query))
                .await;
            match result {
                Ok(_) => {
                    debug!(user_id = %user_id, "session created");
                    return Ok(token);
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {}
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::Storage(anyhow::anyhow!(
            "failed to create a unique session token"
        )))
    }

    /// Resolve a session token into its (current) user record.
    ///
    /// Returns `Ok(None)` when the token is unknown or expired.
    ///
    /// # Errors
    /// Returns `Storage` on database failure.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<UserRecord>> {
        let query = r"
            SELECT u.id, u.name, u.role, u.email, u.password_hash
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.session_hash = ?1
              AND s.expires_at > CAST(strftime('%s', 'now') AS INTEGER)
        ";
        let row = sqlx::query(query)
            .bind(hash_session_token(token))
            .fetch_optional(self.pool())
            .instrument(query_span("SELECT", query))
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// # Errors
    /// Returns `Storage` on database failure.
    pub async fn delete_session(&self, token: &str) -> Result<()> {
        let query = "DELETE FROM sessions WHERE session_hash = ?1";
        sqlx::query(query)
            .bind(hash_session_token(token))
            .execute(self.pool())
            .instrument(query_span("DELETE", query))
            .await?;
        Ok(())
    }

    /// Drop sessions past their expiry. Returns how many were removed.
    ///
    /// # Errors
    /// Returns `Storage` on database failure.
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let query =
            "DELETE FROM sessions WHERE expires_at <= CAST(strftime('%s', 'now') AS INTEGER)";
        let result = sqlx::query(query)
            .execute(self.pool())
            .instrument(query_span("DELETE", query))
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::tests::memory_store;
    use crate::roles::Role;

    #[test]
    fn tokens_are_random_and_url_safe() {
        let a = generate_session_token().expect("token");
        let b = generate_session_token().expect("token");
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn hash_is_sha256_sized() {
        assert_eq!(hash_session_token("abc").len(), 32);
    }

    #[tokio::test]
    async fn session_round_trip_and_logout() {
        let store = memory_store().await;
        let id = store
            .register("Ann", Role::Student, "ann@example.com", "pw")
            .await
            .expect("register");
        let token = store.create_session(id, 3600).await.expect("session");

        let user = store
            .resolve_session(&token)
            .await
            .expect("resolve")
            .expect("active session");
        assert_eq!(user.id, id);

        store.delete_session(&token).await.expect("logout");
        assert!(store.resolve_session(&token).await.expect("resolve").is_none());
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let store = memory_store().await;
        let id = store
            .register("Ann", Role::Student, "ann@example.com", "pw")
            .await
            .expect("register");
        let token = store.create_session(id, -10).await.expect("session");
        assert!(store.resolve_session(&token).await.expect("resolve").is_none());
        assert_eq!(store.purge_expired_sessions().await.expect("purge"), 1);
    }

    #[tokio::test]
    async fn deleting_a_user_ends_their_sessions() {
        let store = memory_store().await;
        let id = store
            .register("Ann", Role::Student, "ann@example.com", "pw")
            .await
            .expect("register");
        let token = store.create_session(id, 3600).await.expect("session");
        store.delete(id).await.expect("delete");
        assert!(store.resolve_session(&token).await.expect("resolve").is_none());
    }
}
