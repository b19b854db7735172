//! Study dashboard: any signed-in role may draw flashcards.

use axum::{
    extract::{Extension, Form, Query},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    notice::{fail, NoticeQuery},
    pages,
    session::require,
};
use crate::{bank::FlashcardBank, credentials::CredentialStore, quiz, roles::Capability};

#[derive(Debug, Default, Deserialize)]
pub struct StudyForm {
    pub topic: Option<String>,
    pub custom_topic: Option<String>,
    pub num_flashcards: Option<String>,
}

pub async fn dashboard(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
) -> Response {
    let user = match require(&headers, &store, Capability::SelfService).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match bank.list_topics().await {
        Ok(topics) => {
            Html(pages::study(&user, &topics, None, &[], query.as_deref())).into_response()
        }
        Err(err) => fail(err, "/"),
    }
}

/// Draw cards for the chosen topic. An unknown or empty topic renders the
/// dashboard with zero cards and a notice.
pub async fn study(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
    Form(form): Form<StudyForm>,
) -> Response {
    let user = match require(&headers, &store, Capability::SelfService).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let topics = match bank.list_topics().await {
        Ok(topics) => topics,
        Err(err) => return fail(err, "/"),
    };

    let topic = match quiz::resolve_topic(form.topic.as_deref(), form.custom_topic.as_deref()) {
        Ok(topic) => topic,
        Err(err) => {
            let notice = err.to_string();
            return Html(pages::study(&user, &topics, None, &[], Some(&notice))).into_response();
        }
    };

    match quiz::study(&bank, &topic, form.num_flashcards.as_deref()).await {
        Ok(cards) => Html(pages::study(&user, &topics, Some(&topic), &cards, None)).into_response(),
        Err(err) if err.is_user_facing() => {
            let notice = err.to_string();
            Html(pages::study(&user, &topics, Some(&topic), &[], Some(&notice))).into_response()
        }
        Err(err) => fail(err, "/normal_dashboard"),
    }
}
