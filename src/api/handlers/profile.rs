//! Self-service profile and password changes for any signed-in role.

use axum::{
    extract::{Extension, Form, Query},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::{
    notice::{fail, redirect_with_notice, NoticeQuery},
    pages, required,
    session::require,
    valid_email,
};
use crate::{
    credentials::{CredentialStore, UserUpdate},
    error::Error,
    roles::Capability,
};

#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ProfileForm {
    fn parse(&self) -> Result<UserUpdate, Error> {
        let name = required("name", self.name.as_deref())?;
        let email = required("email", self.email.as_deref())?;
        if !valid_email(&email) {
            return Err(Error::Validation(format!("Invalid email address: {email}")));
        }
        Ok(UserUpdate {
            name: Some(name),
            email: Some(email),
            role: None,
        })
    }
}

#[derive(Default, Deserialize)]
pub struct PasswordForm {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn update_profile_page(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    match require(&headers, &store, Capability::SelfService).await {
        Ok(user) => Html(pages::update_profile(&user, query.as_deref())).into_response(),
        Err(response) => response,
    }
}

pub async fn update_profile(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let user = match require(&headers, &store, Capability::SelfService).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let result = match form.parse() {
        Ok(update) => store.update(user.id, &update).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => redirect_with_notice("/normal_dashboard", "Profile updated"),
        Err(err) => fail(err, "/update_profile"),
    }
}

pub async fn change_password_page(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    match require(&headers, &store, Capability::SelfService).await {
        Ok(user) => Html(pages::change_password(&user, query.as_deref())).into_response(),
        Err(response) => response,
    }
}

pub async fn change_password(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Form(form): Form<PasswordForm>,
) -> Response {
    let user = match require(&headers, &store, Capability::SelfService).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let (Some(current), Some(new)) = (
        form.current_password.filter(|p| !p.is_empty()),
        form.new_password.filter(|p| !p.trim().is_empty()),
    ) else {
        return fail(
            Error::Validation("Both password fields are required".to_string()),
            "/change_password",
        );
    };

    match store.change_password(user.id, &current, &new).await {
        Ok(()) => redirect_with_notice("/normal_dashboard", "Password changed"),
        Err(err) => fail(err, "/change_password"),
    }
}
