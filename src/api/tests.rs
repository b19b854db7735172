use super::*;
use crate::{credentials::tests::memory_store, roles::Role};
use axum::http::{
    header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    Method, StatusCode,
};
use axum::response::Response;
use tempfile::TempDir;
use tower::ServiceExt;
use url::form_urlencoded;

struct TestApp {
    router: Router,
    store: CredentialStore,
    bank: Arc<FlashcardBank>,
    _dir: TempDir,
}

async fn test_app() -> TestApp {
    let dir = TempDir::new().expect("tempdir");
    let bank = Arc::new(FlashcardBank::new(dir.path().join("questions.json")));
    bank.seed_defaults_if_missing().await.expect("seed");
    let store = memory_store().await;
    let router = router(store.clone(), bank.clone(), Arc::new(AuthConfig::new()));
    TestApp {
        router,
        store,
        bank,
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router")
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("request")).await
    }

    async fn post(&self, uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Response {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).expect("request"))
            .await
    }

    /// Register directly in the store and log in through the form; returns the
    /// `name=value` cookie pair.
    async fn signed_in(&self, role: Role, claim: Role, email: &str) -> String {
        self.store
            .register("Test", role, email, "secret")
            .await
            .expect("register");
        let response = self
            .post(
                "/login",
                &[("email", email), ("password", "secret"), ("role", claim.as_str())],
                None,
            )
            .await;
        session_pair(&response).expect("session cookie")
    }
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn session_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login() {
    let app = test_app().await;
    let response = app.get("/normal_dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?notice="));
}

#[tokio::test]
async fn home_is_public_and_counts_users() {
    let app = test_app().await;
    app.store
        .register("Ann", Role::Normal, "ann@example.com", "pw")
        .await
        .expect("register");
    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Registered users: <strong>1</strong>"));
}

#[tokio::test]
async fn register_then_login_lands_on_claimed_dashboard() {
    let app = test_app().await;
    let response = app
        .post(
            "/register",
            &[
                ("name", "Ann"),
                ("role", "student"),
                ("email", "ann@example.com"),
                ("password", "pw"),
            ],
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?notice=Registration+successful"));

    let response = app
        .post(
            "/login",
            &[
                ("email", "ann@example.com"),
                ("password", "pw"),
                ("role", "student"),
            ],
            None,
        )
        .await;
    assert_eq!(location(&response), "/normal_dashboard");
    let cookie = session_pair(&response).expect("cookie");
    assert!(cookie.starts_with("quizdesk_session="));

    let response = app.get("/normal_dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_registration_returns_a_notice() {
    let app = test_app().await;
    app.store
        .register("Ann", Role::Normal, "ann@example.com", "pw")
        .await
        .expect("register");
    let response = app
        .post(
            "/register",
            &[
                ("name", "Ann again"),
                ("role", "normal"),
                ("email", "ann@example.com"),
                ("password", "pw"),
            ],
            None,
        )
        .await;
    assert!(location(&response).starts_with("/register?notice=Email+ann%40example.com"));
    assert_eq!(app.store.count().await.expect("count"), 1);
}

#[tokio::test]
async fn invalid_login_and_role_mismatch_redirect_back_to_login() {
    let app = test_app().await;
    app.store
        .register("Sam", Role::Student, "sam@example.com", "pw")
        .await
        .expect("register");

    let wrong_password = app
        .post(
            "/login",
            &[("email", "sam@example.com"), ("password", "nope"), ("role", "student")],
            None,
        )
        .await;
    assert_eq!(
        location(&wrong_password),
        "/login?notice=Invalid+email+or+password"
    );
    assert!(session_pair(&wrong_password).is_none());

    let mismatch = app
        .post(
            "/login",
            &[("email", "sam@example.com"), ("password", "pw"), ("role", "teacher")],
            None,
        )
        .await;
    assert!(location(&mismatch).starts_with("/login?notice=Role+mismatch"));

    let no_claim = app
        .post(
            "/login",
            &[("email", "sam@example.com"), ("password", "pw")],
            None,
        )
        .await;
    assert!(location(&no_claim).starts_with("/login?notice=Please+select+a+role"));
}

#[tokio::test]
async fn admin_may_land_on_any_dashboard() {
    let app = test_app().await;
    app.store
        .register("Root", Role::Admin, "root@example.com", "pw")
        .await
        .expect("register");
    for (claim, landing) in [
        ("admin", "/admin_dashboard"),
        ("teacher", "/teacher_dashboard"),
        ("normal", "/normal_dashboard"),
    ] {
        let response = app
            .post(
                "/login",
                &[("email", "root@example.com"), ("password", "pw"), ("role", claim)],
                None,
            )
            .await;
        assert_eq!(location(&response), landing);
    }
}

#[tokio::test]
async fn student_is_forbidden_from_admin_and_bank_routes() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Student, Role::Student, "sam@example.com")
        .await;

    let response = app.get("/admin_dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/?notice="));

    let response = app
        .post(
            "/add_question",
            &[("new_topic", "astronomy"), ("question", "Q"), ("answer", "A")],
            Some(&cookie),
        )
        .await;
    assert!(location(&response).starts_with("/?notice="));
    assert!(!app
        .bank
        .list_topics()
        .await
        .expect("topics")
        .contains(&"astronomy".to_string()));
}

#[tokio::test]
async fn studying_an_unknown_topic_shows_zero_cards() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Normal, Role::Normal, "nora@example.com")
        .await;
    let response = app
        .post(
            "/normal_dashboard",
            &[("topic", "math"), ("custom_topic", "astronomy"), ("num_flashcards", "3")],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("No questions available for topic astronomy"));
    assert!(!body.contains(r#"class="flashcards""#));
}

#[tokio::test]
async fn studying_a_known_topic_draws_the_requested_count() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Student, Role::Student, "sam@example.com")
        .await;
    let response = app
        .post(
            "/normal_dashboard",
            &[("topic", "math"), ("num_flashcards", "2")],
            Some(&cookie),
        )
        .await;
    let body = body_text(response).await;
    assert_eq!(body.matches("<li><p><strong>").count(), 2);

    let response = app
        .post(
            "/normal_dashboard",
            &[("topic", "math"), ("num_flashcards", "0")],
            Some(&cookie),
        )
        .await;
    assert!(body_text(response)
        .await
        .contains("enter a positive number of cards"));
}

#[tokio::test]
async fn teacher_manages_the_bank() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Teacher, Role::Teacher, "tess@example.com")
        .await;

    let response = app
        .post(
            "/add_question",
            &[
                ("topic", "math"),
                ("new_topic", "astronomy"),
                ("question", "Closest star?"),
                ("answer", "The Sun"),
            ],
            Some(&cookie),
        )
        .await;
    assert!(location(&response).starts_with("/add_question?notice=Question+added+to+astronomy"));
    let added = app.bank.get_question("astronomy", 0).await.expect("added");
    assert_eq!(added.answer, "The Sun");

    let response = app
        .post(
            "/edit_question/astronomy/0",
            &[("question", "Nearest star?"), ("answer", "Sol")],
            Some(&cookie),
        )
        .await;
    assert!(location(&response).starts_with("/manage_questions?notice="));
    let edited = app.bank.get_question("astronomy", 0).await.expect("edited");
    assert_eq!(edited.question, "Nearest star?");

    let response = app
        .get("/delete_question/astronomy/5", Some(&cookie))
        .await;
    assert!(location(&response).starts_with("/manage_questions?notice=Invalid+question+index"));

    let response = app
        .post("/delete_topic", &[("topic", "astronomy")], Some(&cookie))
        .await;
    assert!(location(&response).starts_with("/manage_questions?notice=Topic+astronomy+deleted"));
    assert!(!app
        .bank
        .list_topics()
        .await
        .expect("topics")
        .contains(&"astronomy".to_string()));
}

#[tokio::test]
async fn selected_topic_names_are_matched_exactly() {
    let app = test_app().await;
    app.bank
        .add_question(" padded ", "Q1", "A1")
        .await
        .expect("seed padded topic");
    let cookie = app
        .signed_in(Role::Teacher, Role::Teacher, "tom@example.com")
        .await;

    let response = app
        .post(
            "/add_question",
            &[("topic", " padded "), ("question", "Q2"), ("answer", "A2")],
            Some(&cookie),
        )
        .await;
    assert!(location(&response).starts_with("/add_question?notice=Question+added"));

    let topics = app.bank.list_topics().await.expect("topics");
    assert!(!topics.contains(&"padded".to_string()));
    let added = app.bank.get_question(" padded ", 1).await.expect("added");
    assert_eq!(added.question, "Q2");

    let response = app
        .post(
            "/normal_dashboard",
            &[("topic", " padded "), ("num_flashcards", "2")],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert_eq!(body.matches("<li><p><strong>").count(), 2);
}

#[tokio::test]
async fn role_changes_apply_to_live_sessions() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Student, Role::Student, "sam@example.com")
        .await;
    let sam = app
        .store
        .find_by_email("sam@example.com")
        .await
        .expect("lookup")
        .expect("sam");

    let response = app.get("/teacher_dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(app.store.cycle_role(sam.id).await.expect("cycle"), Role::Teacher);
    let response = app.get("/teacher_dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_edits_a_user_and_rejects_unknown_roles() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Admin, Role::Admin, "root@example.com")
        .await;
    let id = app
        .store
        .register("Ann", Role::Normal, "ann@example.com", "pw")
        .await
        .expect("register");

    let response = app
        .post(
            &format!("/edit_user/{id}"),
            &[("name", "Ann B"), ("email", "ann@example.com"), ("role", "root")],
            Some(&cookie),
        )
        .await;
    assert!(location(&response).starts_with(&format!("/edit_user/{id}?notice=Unknown+role")));

    let response = app
        .post(
            &format!("/update_user/{id}"),
            &[("name", "Ann B"), ("email", "ann@example.com"), ("role", "teacher")],
            Some(&cookie),
        )
        .await;
    assert!(location(&response).starts_with(&format!("/user_details/{id}?notice=")));
    let ann = app.store.get(id).await.expect("ann");
    assert_eq!((ann.name.as_str(), ann.role), ("Ann B", Role::Teacher));

    let response = app.get(&format!("/delete_user/{id}"), Some(&cookie)).await;
    assert!(location(&response).starts_with("/admin_dashboard?notice=User+deleted"));
    assert!(app
        .store
        .find_by_email("ann@example.com")
        .await
        .expect("lookup")
        .is_none());
}

#[tokio::test]
async fn wrong_current_password_is_a_notice() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Normal, Role::Normal, "nora@example.com")
        .await;
    let response = app
        .post(
            "/change_password",
            &[("current_password", "guess"), ("new_password", "fresh")],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/change_password?notice=Current+password+is+incorrect"));
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = test_app().await;
    let cookie = app
        .signed_in(Role::Normal, Role::Normal, "nora@example.com")
        .await;
    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(location(&response), "/");
    assert!(session_pair(&response).is_some_and(|c| c == "quizdesk_session="));

    let response = app.get("/normal_dashboard", Some(&cookie)).await;
    assert!(location(&response).starts_with("/login?notice="));
}

#[tokio::test]
async fn health_reports_database_and_request_id() {
    let app = test_app().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-app"));
    let body: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
}
