use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use super::{
    notice::{fail, NoticeQuery},
    pages,
    session::current_user,
};
use crate::credentials::CredentialStore;

// Public landing page with the aggregate user count.
pub async fn home(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
) -> Response {
    let user = current_user(&headers, &store).await.unwrap_or_else(|err| {
        error!("Failed to resolve session: {err}");
        None
    });
    match store.count().await {
        Ok(count) => Html(pages::home(user.as_ref(), count, query.as_deref())).into_response(),
        Err(err) => fail(err, "/"),
    }
}
