//! Notice + redirect: how every user-correctable failure leaves a handler.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{error, info};
use url::form_urlencoded;

use super::pages;
use crate::error::Error;

/// `?notice=` carried by a redirect and shown on the target page.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    pub fn as_deref(&self) -> Option<&str> {
        self.notice.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// `303 See Other` to `path` with `message` attached as a notice.
pub fn redirect_with_notice(path: &str, message: &str) -> Response {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("notice", message)
        .finish();
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{separator}{query}")).into_response()
}

/// Turn a domain error into a response: user-facing failures redirect back to
/// `back` with the message; persistence faults become a 500 page.
pub fn fail(err: Error, back: &str) -> Response {
    if err.is_user_facing() {
        info!(back, "request rejected: {err}");
        redirect_with_notice(back, &err.to_string())
    } else {
        error!("request failed: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(pages::internal_error()),
        )
            .into_response()
    }
}
