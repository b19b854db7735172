//! Registration, login and logout.
//!
//! Flow Overview (login):
//! 1) Require a role claim.
//! 2) Check credentials; unknown email and wrong password look the same.
//! 3) Reconcile the claim with the stored role and pick the landing dashboard.
//! 4) Open a session and set the cookie.

use axum::{
    extract::{Extension, Form, Query},
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use super::{
    notice::{fail, redirect_with_notice, NoticeQuery},
    pages, required, required_role,
    session::{clear_session_cookie, extract_session_token, session_cookie, AuthConfig},
    valid_email,
};
use crate::{
    credentials::CredentialStore,
    error::Error,
    roles::{reconcile_claim, Role},
};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Validated input for creating an account, shared with the admin forms.
pub(super) struct NewAccount {
    pub name: String,
    pub role: Role,
    pub email: String,
    pub password: String,
}

impl NewAccount {
    pub(super) fn parse(form: &RegisterForm) -> Result<Self, Error> {
        let name = required("name", form.name.as_deref())?;
        let email = required("email", form.email.as_deref())?;
        if !valid_email(&email) {
            return Err(Error::Validation(format!("Invalid email address: {email}")));
        }
        let password = form
            .password
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::Validation("The password must not be blank".to_string()))?;
        let role = required_role(form.role.as_deref())?;
        Ok(Self {
            name,
            role,
            email,
            password,
        })
    }

    pub(super) async fn create(&self, store: &CredentialStore) -> Result<uuid::Uuid, Error> {
        store
            .register(&self.name, self.role, &self.email, &self.password)
            .await
    }
}

pub async fn register_page(Query(query): Query<NoticeQuery>) -> Html<String> {
    Html(pages::register(query.as_deref()))
}

pub async fn register(
    Extension(store): Extension<CredentialStore>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let account = match NewAccount::parse(&form) {
        Ok(account) => account,
        Err(err) => return fail(err, "/register"),
    };
    match account.create(&store).await {
        Ok(_) => redirect_with_notice("/login", "Registration successful, please log in"),
        Err(err) => fail(err, "/register"),
    }
}

pub async fn login_page(Query(query): Query<NoticeQuery>) -> Html<String> {
    Html(pages::login(query.as_deref()))
}

pub async fn login(
    Extension(store): Extension<CredentialStore>,
    Extension(config): Extension<Arc<AuthConfig>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let claim = match form.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(err) => return fail(err, "/login"),
        },
        None => None,
    };
    if claim.is_none() {
        return fail(
            Error::Authentication("Please select a role".to_string()),
            "/login",
        );
    }

    let email = form.email.unwrap_or_default();
    let password = form.password.unwrap_or_default();
    let user = match store.authenticate(email.trim(), &password).await {
        Ok(user) => user,
        Err(err) => return fail(err, "/login"),
    };

    let surface = match reconcile_claim(user.role, claim) {
        Ok(surface) => surface,
        Err(err) => return fail(err, "/login"),
    };

    let token = match store
        .create_session(user.id, config.session_ttl_seconds())
        .await
    {
        Ok(token) => token,
        Err(err) => return fail(err, "/login"),
    };

    let cookie = match session_cookie(&config, &token) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return fail(Error::Storage(err.into()), "/login");
        }
    };

    info!(user_id = %user.id, role = %user.role, landing = surface.path(), "login");
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (headers, Redirect::to(surface.path())).into_response()
}

pub async fn logout(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Extension(config): Extension<Arc<AuthConfig>>,
) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(err) = store.delete_session(&token).await {
            error!("Failed to delete session: {err}");
        }
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(&config) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (response_headers, Redirect::to("/")).into_response()
}
