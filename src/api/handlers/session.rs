//! Session cookie handling and per-request principal resolution.
//!
//! Flow Overview: read the session cookie, resolve it to the *current* user
//! row (so role changes apply on the next request), then check the route's
//! capability against the stored role.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use axum::response::Response;
use tracing::{info, warn};

use super::notice::{fail, redirect_with_notice};
use crate::{
    credentials::{CredentialStore, UserRecord},
    error::Error,
    roles::Capability,
};

pub const SESSION_COOKIE_NAME: &str = "quizdesk_session";

/// Cookie/session settings shared by the auth handlers.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    session_ttl_seconds: i64,
    cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: 60 * 60 * 24,
            cookie_secure: false,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub const fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub const fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

/// Build the `HttpOnly` cookie carrying the raw session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve the session cookie into the signed-in user, if any.
///
/// # Errors
/// Returns `Storage` if the session lookup fails.
pub(super) async fn current_user(
    headers: &HeaderMap,
    store: &CredentialStore,
) -> Result<Option<UserRecord>, Error> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    store.resolve_session(&token).await
}

/// Require a signed-in user whose stored role grants `capability`.
///
/// Anonymous visitors are sent to the login page; signed-in users lacking the
/// capability are sent home with a notice.
pub(super) async fn require(
    headers: &HeaderMap,
    store: &CredentialStore,
    capability: Capability,
) -> Result<UserRecord, Response> {
    match current_user(headers, store).await {
        Ok(Some(user)) if capability.allows(user.role) => Ok(user),
        Ok(Some(user)) => {
            warn!(user_id = %user.id, role = %user.role, ?capability, "forbidden");
            Err(redirect_with_notice("/", &Error::Forbidden.to_string()))
        }
        Ok(None) => {
            info!(?capability, "anonymous request to protected route");
            Err(redirect_with_notice("/login", "Please log in to continue"))
        }
        Err(err) => Err(fail(err, "/")),
    }
}
