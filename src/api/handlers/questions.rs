//! Flashcard bank administration for teachers and admins.
//!
//! Questions are addressed as `/<action>/<topic>/<index>`. An index that
//! has gone stale (a concurrent delete shifted the list) surfaces as a
//! "not found" notice on the management page.

use axum::{
    extract::{Extension, Form, Path, Query},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{
    notice::{fail, redirect_with_notice, NoticeQuery},
    pages, required,
    session::require,
};
use crate::{
    bank::FlashcardBank, credentials::CredentialStore, error::Error, roles::Capability,
};

const MANAGE: &str = "/manage_questions";

#[derive(Debug, Default, Deserialize)]
pub struct AddQuestionForm {
    /// Existing topic picked from the list.
    pub topic: Option<String>,
    /// Free-text topic; wins over `topic` when non-blank.
    pub new_topic: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl AddQuestionForm {
    fn topic(&self) -> Result<String, Error> {
        let typed = self.new_topic.as_deref().map(str::trim).filter(|t| !t.is_empty());
        // Selected names come from the bank and must match it exactly.
        let selected = self.topic.as_deref().filter(|t| !t.trim().is_empty());
        typed.or(selected).map(str::to_string).ok_or_else(|| {
            Error::Validation("Select an existing topic or enter a new one".to_string())
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionForm {
    pub question: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopicForm {
    pub topic: Option<String>,
}

fn parse_index(topic: &str, raw: &str) -> Result<usize, Error> {
    raw.trim().parse::<usize>().map_err(|_| {
        Error::NotFound(format!("Invalid question index {raw} for topic {topic}"))
    })
}

pub async fn teacher_dashboard(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match bank.topics().await {
        Ok(topics) => {
            Html(pages::teacher_dashboard(&user, &topics, query.as_deref())).into_response()
        }
        Err(err) => fail(err, "/"),
    }
}

pub async fn manage_questions(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match bank.topics().await {
        Ok(topics) => {
            Html(pages::manage_questions(&user, &topics, query.as_deref())).into_response()
        }
        Err(err) => fail(err, "/teacher_dashboard"),
    }
}

pub async fn add_question_page(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match bank.list_topics().await {
        Ok(topics) => Html(pages::add_question(&user, &topics, query.as_deref())).into_response(),
        Err(err) => fail(err, "/teacher_dashboard"),
    }
}

pub async fn add_question(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
    Form(form): Form<AddQuestionForm>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let topic = match form.topic() {
        Ok(topic) => topic,
        Err(err) => return fail(err, "/add_question"),
    };
    let question = form.question.as_deref().unwrap_or_default().trim();
    let answer = form.answer.as_deref().unwrap_or_default().trim();

    match bank.add_question(&topic, question, answer).await {
        Ok(()) => {
            info!(user_id = %user.id, topic = %topic, "question added");
            redirect_with_notice("/add_question", &format!("Question added to {topic}"))
        }
        Err(err) => fail(err, "/add_question"),
    }
}

pub async fn edit_question_page(
    Path((topic, index)): Path<(String, String)>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let index = match parse_index(&topic, &index) {
        Ok(index) => index,
        Err(err) => return fail(err, MANAGE),
    };
    match bank.get_question(&topic, index).await {
        Ok(question) => Html(pages::edit_question(
            &user,
            &topic,
            index,
            &question,
            query.as_deref(),
        ))
        .into_response(),
        Err(err) => fail(err, MANAGE),
    }
}

pub async fn edit_question(
    Path((topic, index)): Path<(String, String)>,
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
    Form(form): Form<QuestionForm>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let index = match parse_index(&topic, &index) {
        Ok(index) => index,
        Err(err) => return fail(err, MANAGE),
    };
    let fields = required("question", form.question.as_deref())
        .and_then(|q| required("answer", form.answer.as_deref()).map(|a| (q, a)));
    let (question, answer) = match fields {
        Ok(fields) => fields,
        Err(err) => return fail(err, &pages::question_link("edit_question", &topic, index)),
    };

    match bank.edit_question(&topic, index, &question, &answer).await {
        Ok(()) => {
            info!(user_id = %user.id, topic = %topic, index, "question edited");
            redirect_with_notice(MANAGE, "Question updated")
        }
        Err(err) => fail(err, MANAGE),
    }
}

pub async fn delete_question(
    Path((topic, index)): Path<(String, String)>,
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let index = match parse_index(&topic, &index) {
        Ok(index) => index,
        Err(err) => return fail(err, MANAGE),
    };
    match bank.delete_question(&topic, index).await {
        Ok(_) => {
            info!(user_id = %user.id, topic = %topic, index, "question deleted");
            redirect_with_notice(MANAGE, "Question deleted")
        }
        Err(err) => fail(err, MANAGE),
    }
}

pub async fn delete_topic_page(
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match bank.list_topics().await {
        Ok(topics) => Html(pages::delete_topic(&user, &topics, query.as_deref())).into_response(),
        Err(err) => fail(err, "/teacher_dashboard"),
    }
}

pub async fn delete_topic(
    headers: HeaderMap,
    Extension(store): Extension<CredentialStore>,
    Extension(bank): Extension<Arc<FlashcardBank>>,
    Form(form): Form<TopicForm>,
) -> Response {
    let user = match require(&headers, &store, Capability::BankAdmin).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    // Topic names are stored verbatim, so no trimming here.
    let Some(topic) = form.topic.filter(|t| !t.is_empty()) else {
        return fail(
            Error::Validation("Select a topic to delete".to_string()),
            "/delete_topic_page",
        );
    };
    match bank.delete_topic(&topic).await {
        Ok(true) => {
            info!(user_id = %user.id, topic = %topic, "topic deleted");
            redirect_with_notice(MANAGE, &format!("Topic {topic} deleted"))
        }
        Ok(false) => redirect_with_notice(MANAGE, &format!("Topic {topic} was already gone")),
        Err(err) => fail(err, MANAGE),
    }
}
