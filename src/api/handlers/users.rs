//! Admin-only user directory management.
//!
//! Flow Overview:
//! 1) Authenticate the request via session cookie.
//! 2) Require the `UserAdmin` capability (stored role `admin`).
//! 3) Perform the read or allow-listed update and redirect back with a notice.

use axum::{
    extract::{Extension, Form, Path, Query},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::{
    auth::{NewAccount, RegisterForm},
    notice::{fail, redirect_with_notice, NoticeQuery},
    pages, parse_user_id, required, required_role,
    session::require,
    valid_email,
};
use crate::{
    credentials::{CredentialStore, UserUpdate},
    error::Error,
    roles::Capability,
};

const DASHBOARD: &str = "/admin_dashboard";

#[derive(Debug, Default, Deserialize)]
pub struct EditUserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl EditUserForm {
    fn parse(&self) -> Result<UserUpdate, Error> {
        let email = required("email", self.email.as_deref())?;
        if !valid_email(&email) {
            return Err(Error::Validation(format!("Invalid email address: {email}")));
        }
        Ok(UserUpdate {
            name: Some(required("name", self.name.as_deref())?),
            email: Some(email),
            role: Some(required_role(self.role.as_deref())?),
        })
    }
}

pub async fn admin_dashboard(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    let admin = match require(&headers, &store, Capability::UserAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match store.list_all().await {
        Ok(users) => Html(pages::admin_dashboard(&admin, &users, query.as_deref())).into_response(),
        Err(err) => fail(err, "/"),
    }
}

/// Create an account from an admin form, then return to `back`.
async fn create_from_form(
    headers: &HeaderMap,
    store: &CredentialStore,
    form: &RegisterForm,
    back: &str,
) -> Response {
    if let Err(response) = require(headers, store, Capability::UserAdmin).await {
        return response;
    }
    let account = match NewAccount::parse(form) {
        Ok(account) => account,
        Err(err) => return fail(err, back),
    };
    match account.create(store).await {
        Ok(_) => redirect_with_notice(DASHBOARD, &format!("User {} created", account.email)),
        Err(err) => fail(err, back),
    }
}

pub async fn create_user(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Form(form): Form<RegisterForm>,
) -> Response {
    create_from_form(&headers, &store, &form, DASHBOARD).await
}

pub async fn add_user_page(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    match require(&headers, &store, Capability::UserAdmin).await {
        Ok(admin) => Html(pages::add_user(&admin, query.as_deref())).into_response(),
        Err(response) => response,
    }
}

pub async fn add_user(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Form(form): Form<RegisterForm>,
) -> Response {
    create_from_form(&headers, &store, &form, "/add_user").await
}

pub async fn user_details(
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    let admin = match require(&headers, &store, Capability::UserAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let user = match parse_user_id(&id) {
        Ok(user_id) => store.get(user_id).await,
        Err(err) => Err(err),
    };
    match user {
        Ok(user) => Html(pages::user_details(&admin, &user, query.as_deref())).into_response(),
        Err(err) => fail(err, DASHBOARD),
    }
}

pub async fn delete_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    if let Err(response) = require(&headers, &store, Capability::UserAdmin).await {
        return response;
    }
    let result = match parse_user_id(&id) {
        Ok(user_id) => store.delete(user_id).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => redirect_with_notice(DASHBOARD, "User deleted"),
        Err(err) => fail(err, DASHBOARD),
    }
}

/// Advance the user's role one step along the role cycle.
pub async fn change_role(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    if let Err(response) = require(&headers, &store, Capability::UserAdmin).await {
        return response;
    }
    let result = match parse_user_id(&id) {
        Ok(user_id) => store.cycle_role(user_id).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(role) => redirect_with_notice(DASHBOARD, &format!("Role changed to {role}")),
        Err(err) => fail(err, DASHBOARD),
    }
}

pub async fn edit_user_page(
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    let admin = match require(&headers, &store, Capability::UserAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let user = match parse_user_id(&id) {
        Ok(user_id) => store.get(user_id).await,
        Err(err) => Err(err),
    };
    match user {
        Ok(user) => Html(pages::edit_user(&admin, &user, query.as_deref())).into_response(),
        Err(err) => fail(err, DASHBOARD),
    }
}

pub async fn edit_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Form(form): Form<EditUserForm>,
) -> Response {
    if let Err(response) = require(&headers, &store, Capability::UserAdmin).await {
        return response;
    }
    let user_id = match parse_user_id(&id) {
        Ok(user_id) => user_id,
        Err(err) => return fail(err, DASHBOARD),
    };
    let back = format!("/edit_user/{user_id}");
    let update = match form.parse() {
        Ok(update) => update,
        Err(err) => return fail(err, &back),
    };
    match store.update(user_id, &update).await {
        Ok(()) => redirect_with_notice(&format!("/user_details/{user_id}"), "User updated"),
        Err(err @ Error::NotFound(_)) => fail(err, DASHBOARD),
        Err(err) => fail(err, &back),
    }
}
