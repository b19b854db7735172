use crate::{
    api::handlers::{auth, health, profile, questions, root, session::AuthConfig, study, users},
    bank::FlashcardBank,
    credentials::CredentialStore,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;

pub mod handlers;

#[cfg(test)]
mod tests;

/// Build the application router with every page and form route registered.
#[must_use]
pub fn router(
    store: CredentialStore,
    bank: Arc<FlashcardBank>,
    auth_config: Arc<AuthConfig>,
) -> Router {
    Router::new()
        .route("/", get(root::home))
        .route("/health", get(health::health))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/normal_dashboard", get(study::dashboard).post(study::study))
        .route(
            "/admin_dashboard",
            get(users::admin_dashboard).post(users::create_user),
        )
        .route("/add_user", get(users::add_user_page).post(users::add_user))
        .route("/user_details/:id", get(users::user_details))
        .route("/delete_user/:id", get(users::delete_user))
        .route("/change_role/:id", get(users::change_role))
        .route(
            "/edit_user/:id",
            get(users::edit_user_page).post(users::edit_user),
        )
        .route(
            "/update_user/:id",
            get(users::edit_user_page).post(users::edit_user),
        )
        .route(
            "/update_profile",
            get(profile::update_profile_page).post(profile::update_profile),
        )
        .route(
            "/change_password",
            get(profile::change_password_page).post(profile::change_password),
        )
        .route("/teacher_dashboard", get(questions::teacher_dashboard))
        .route(
            "/add_question",
            get(questions::add_question_page).post(questions::add_question),
        )
        .route("/manage_questions", get(questions::manage_questions))
        .route(
            "/edit_question/:topic/:index",
            get(questions::edit_question_page).post(questions::edit_question),
        )
        .route(
            "/delete_question/:topic/:index",
            get(questions::delete_question),
        )
        .route("/delete_topic", post(questions::delete_topic))
        .route("/delete_topic_page", get(questions::delete_topic_page))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_config))
                .layer(Extension(bank))
                .layer(Extension(store)),
        )
}

/// Start the server
/// # Errors
/// Return error if the stores cannot be opened or the listener fails
pub async fn new(
    port: u16,
    dsn: String,
    bank_path: PathBuf,
    auth_config: AuthConfig,
) -> Result<()> {
    let store = CredentialStore::connect(&dsn)
        .await
        .context("Failed to open credential store")?;

    match store.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => info!(purged, "purged expired sessions"),
        Err(err) => warn!("Failed to purge expired sessions: {err}"),
    }

    let bank = Arc::new(FlashcardBank::new(bank_path));
    bank.seed_defaults_if_missing()
        .await
        .context("Failed to seed flashcard bank")?;

    let app = router(store, bank, Arc::new(auth_config));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
