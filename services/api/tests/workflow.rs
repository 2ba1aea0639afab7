//! Drives the full HTTP surface against in-memory adapters.

use api_lib::config::Config;
use api_lib::web::{self, Adapters, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use study_notes_core::testing::{
    FakeAnswerChecker, FakeFlashcardGenerator, FakeSummarizer, InMemoryDatabase, PlainHasher,
    RecordingNotifier,
};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    db: Arc<InMemoryDatabase>,
    notifier: Arc<RecordingNotifier>,
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        openai_base_url: None,
        summary_model: "test".to_string(),
        flashcard_model: "test".to_string(),
        grading_model: "test".to_string(),
        session_ttl_days: 30,
        reset_token_ttl_minutes: 30,
        password_reset_url: "http://localhost:3000/reset-password".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        secure_cookies: false,
    }
}

fn app_with(summarizer: FakeSummarizer) -> TestApp {
    let db = Arc::new(InMemoryDatabase::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let adapters = Adapters {
        db: db.clone(),
        hasher: Arc::new(PlainHasher),
        notifier: notifier.clone(),
        summarizer: Arc::new(summarizer),
        flashcard_generator: Arc::new(FakeFlashcardGenerator::default()),
        grader: Arc::new(FakeAnswerChecker::default()),
    };
    let state = Arc::new(AppState::new(Arc::new(test_config()), adapters));
    TestApp {
        router: web::router(state),
        db,
        notifier,
    }
}

fn app() -> TestApp {
    app_with(FakeSummarizer::default())
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, value)
    }

    /// Registers a user and logs in, returning `(user_id, session_token)`.
    async fn signed_up(&self, username: &str) -> (Uuid, String) {
        let (status, _, user) = self
            .call(
                "POST",
                "/user/create-user",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password123"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");

        let (status, _, login) = self
            .call(
                "POST",
                "/user/login",
                None,
                Some(json!({"username": username, "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{login}");
        (
            id_of(&user["id"]),
            login["session_token"].as_str().unwrap().to_string(),
        )
    }

    async fn note(&self, token: &str, content: &str) -> Uuid {
        let (status, _, note) = self
            .call(
                "POST",
                "/note/store-note",
                Some(token),
                Some(json!({"title": "Water", "content": content})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{note}");
        id_of(&note["id"])
    }

    /// Creates a note and runs it through summary and flashcard generation.
    async fn note_with_flashcards(&self, token: &str) -> (Uuid, Vec<Value>) {
        let note_id = self
            .note(token, "Water boils at 100 degrees. It freezes at zero.")
            .await;
        let (status, _, _) = self
            .call("POST", &format!("/llm/generate-summary/{note_id}"), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, cards) = self
            .call("POST", &format!("/llm/generate-flashcard/{note_id}"), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        (note_id, cards.as_array().unwrap().clone())
    }
}

fn id_of(value: &Value) -> Uuid {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn ping_is_public() {
    let app = app();
    let (status, _, body) = app.call("GET", "/api/v1/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "pong");
}

#[tokio::test]
async fn study_session_end_to_end() {
    let app = app();
    let (_, token) = app.signed_up("alice").await;
    let (note_id, cards) = app.note_with_flashcards(&token).await;
    assert_eq!(cards.len(), 2);

    let (_, _, note) = app
        .call("GET", &format!("/note/get-note/{note_id}"), Some(&token), None)
        .await;
    assert_eq!(note["summary"], "Summary: Water boils at 100 degrees.");
    assert_eq!(note["language"], "en");

    let (status, _, quiz) = app
        .call("POST", &format!("/quiz/start/{note_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quiz["state"], "not_started");
    assert_eq!(quiz["flashcard_ids"].as_array().unwrap().len(), 2);
    let quiz_id = id_of(&quiz["id"]);

    let (_, _, next) = app
        .call("GET", &format!("/quiz/next/{quiz_id}"), Some(&token), None)
        .await;
    assert_eq!(next["done"], false);
    assert!(next["flashcard"].get("answer").is_none());

    let arithmetic = cards
        .iter()
        .find(|c| c["question"] == "What is two plus two?")
        .unwrap();
    let other = cards
        .iter()
        .find(|c| c["question"] != "What is two plus two?")
        .unwrap();

    let (status, _, first) = app
        .call(
            "POST",
            &format!("/quiz/submit-answer/{quiz_id}"),
            Some(&token),
            Some(json!({"flashcard_id": arithmetic["id"], "answer": " Four "})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["correct"], true);
    assert_eq!(first["progress"]["state"], "in_progress");
    assert_eq!(first["progress"]["answered"], 1);

    let (_, _, second) = app
        .call(
            "POST",
            &format!("/quiz/submit-answer/{quiz_id}"),
            Some(&token),
            Some(json!({"flashcard_id": other["id"], "answer": "no idea"})),
        )
        .await;
    assert_eq!(second["correct"], false);
    assert_eq!(second["progress"]["state"], "completed");
    assert_eq!(second["progress"]["correct"], 1);
    assert_eq!(second["progress"]["remaining"], 0);
    assert_eq!(second["progress"]["percent"], 100.0);

    let (_, _, next) = app
        .call("GET", &format!("/quiz/next/{quiz_id}"), Some(&token), None)
        .await;
    assert_eq!(next["done"], true);
    assert!(next["flashcard"].is_null());

    let (status, _, progress) = app
        .call("GET", &format!("/quiz/progress/{note_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["quiz_id"], quiz["id"]);
    assert_eq!(progress["answered"], 2);

    let (status, _, body) = app
        .call(
            "POST",
            &format!("/quiz/submit-answer/{quiz_id}"),
            Some(&token),
            Some(json!({"flashcard_id": other["id"], "answer": "again"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_sets_a_cookie_that_authenticates() {
    let app = app();
    app.signed_up("bob").await;
    let (_, headers, _) = app
        .call(
            "POST",
            "/user/login",
            None,
            Some(json!({"username": "bob", "password": "password123"})),
        )
        .await;
    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let session = cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/note/get-notes")
        .header(header::COOKIE, session)
        .body(Body::empty())
        .unwrap();
    let (status, _, notes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notes, json!([]));
}

#[tokio::test]
async fn protected_routes_reject_missing_and_revoked_sessions() {
    let app = app();
    let (status, _, body) = app.call("GET", "/note/get-notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (_, token) = app.signed_up("carol").await;
    let (status, headers, _) = app.call("POST", "/user/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .contains("Max-Age=0"));

    let (status, _, _) = app.call("GET", "/note/get-notes", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = app();
    app.signed_up("dave").await;
    let (status, _, body) = app
        .call(
            "POST",
            "/user/create-user",
            None,
            Some(json!({
                "username": "dave2",
                "email": "dave@example.com",
                "password": "password123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already exists.");
}

#[tokio::test]
async fn notes_of_other_users_are_forbidden() {
    let app = app();
    let (_, owner) = app.signed_up("erin").await;
    let (_, intruder) = app.signed_up("frank").await;
    let note_id = app.note(&owner, "Private thoughts.").await;

    let (status, _, _) = app
        .call("GET", &format!("/note/get-note/{note_id}"), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .call(
            "PUT",
            &format!("/note/update-note/{note_id}"),
            Some(&intruder),
            Some(json!({"title": "mine now"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .call("DELETE", &format!("/note/delete-note/{note_id}"), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _, notes) = app.call("GET", "/note/get-notes", Some(&intruder), None).await;
    assert_eq!(notes, json!([]));
}

#[tokio::test]
async fn answering_a_card_from_another_note_fails_validation() {
    let app = app();
    let (_, token) = app.signed_up("gina").await;
    let (note_id, _) = app.note_with_flashcards(&token).await;
    let (_, other_cards) = app.note_with_flashcards(&token).await;

    let (_, _, quiz) = app
        .call("POST", &format!("/quiz/start/{note_id}"), Some(&token), None)
        .await;
    let (status, _, body) = app
        .call(
            "POST",
            &format!("/quiz/submit-answer/{}", id_of(&quiz["id"])),
            Some(&token),
            Some(json!({"flashcard_id": other_cards[0]["id"], "answer": "four"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Flashcard does not belong to this quiz.");
}

#[tokio::test]
async fn regenerating_flashcards_issues_fresh_ids() {
    let app = app();
    let (user_id, token) = app.signed_up("hank").await;
    let (note_id, first) = app.note_with_flashcards(&token).await;

    let (_, _, second) = app
        .call("POST", &format!("/llm/generate-flashcard/{note_id}"), Some(&token), None)
        .await;
    let second = second.as_array().unwrap();
    assert_eq!(second.len(), first.len());
    assert!(first.iter().all(|a| second.iter().all(|b| a["id"] != b["id"])));

    let (_, _, all) = app
        .call("GET", &format!("/user/fetch-flashcards/{user_id}"), Some(&token), None)
        .await;
    assert_eq!(all.as_array().unwrap().len(), second.len());

    let (status, _, _) = app
        .call("DELETE", &format!("/note/{note_id}/flashcards"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = app
        .call("POST", &format!("/quiz/start/{note_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summarizer_outage_is_service_unavailable() {
    let app = app_with(FakeSummarizer { fail: true });
    let (_, token) = app.signed_up("ivy").await;
    let note_id = app.note(&token, "Something worth summarizing.").await;

    let (status, _, body) = app
        .call("POST", &format!("/llm/generate-summary/{note_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    let (status, _, body) = app
        .call("POST", &format!("/llm/generate-flashcard/{note_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No summary available for this note.");
}

#[tokio::test]
async fn check_answer_judges_without_recording() {
    let app = app();
    let (_, token) = app.signed_up("jack").await;
    let (status, _, body) = app
        .call(
            "POST",
            "/llm/check-answer",
            Some(&token),
            Some(json!({"question": "2+2?", "correct_answer": "four", "user_answer": "five"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correct"], false);

    let (status, _, _) = app
        .call("POST", "/llm/check-answer", Some(&token), Some(json!({"question": "2+2?"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = app();
    app.signed_up("kate").await;

    let (status, _, _) = app
        .call(
            "POST",
            "/user/request-password-reset",
            None,
            Some(json!({"email": "kate@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, link) = app.notifier.sent().pop().unwrap();
    let token = link.split("token=").nth(1).unwrap().to_string();

    let reset = json!({
        "token": token,
        "new_password": "brand-new-pass",
        "confirm_password": "brand-new-pass"
    });
    let (status, _, _) = app
        .call("POST", "/user/password-reset", None, Some(reset.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = app
        .call("POST", "/user/password-reset", None, Some(reset))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The provided token is either expired or invalid.");

    let (status, _, _) = app
        .call(
            "POST",
            "/user/login",
            None,
            Some(json!({"username": "kate", "password": "brand-new-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn listing_users_requires_admin() {
    let app = app();
    let (user_id, token) = app.signed_up("liam").await;

    let (status, _, _) = app.call("GET", "/user/list-users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.db.make_admin(user_id).unwrap();
    let (status, _, users) = app.call("GET", "/user/list-users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_input_is_a_json_bad_request() {
    let app = app();
    let (_, token) = app.signed_up("mia").await;

    let request = Request::builder()
        .method("POST")
        .uri("/note/store-note")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, body) = app
        .call("GET", "/note/get-note/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
