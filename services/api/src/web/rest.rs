//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the small
//! handlers and payloads that do not belong to a resource.

use crate::web::{llm, notes, quiz, users};
use axum::response::Json;
use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        ping,
        users::create_user,
        users::login,
        users::logout,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::list_users,
        users::fetch_flashcards,
        users::change_password,
        users::request_password_reset,
        users::reset_password,
        notes::store_note,
        notes::get_notes,
        notes::get_note,
        notes::update_note,
        notes::delete_note,
        notes::list_flashcards,
        notes::delete_flashcards,
        llm::generate_summary,
        llm::generate_flashcards,
        llm::check_answer,
        quiz::start_quiz,
        quiz::quiz_progress,
        quiz::next_flashcard,
        quiz::submit_answer,
    ),
    components(schemas(MessageResponse, ErrorResponse)),
    modifiers(&SessionAuth),
    security(("session_cookie" = []), ("bearer" = [])),
    tags(
        (name = "users", description = "Accounts, sessions and password recovery."),
        (name = "notes", description = "Notes and their flashcards."),
        (name = "llm", description = "AI summaries, flashcard generation and answer checking."),
        (name = "quiz", description = "Flashcard quizzes and scoring."),
        (name = "Study Notes API", description = "Health check.")
    )
)]
pub struct ApiDoc;

/// Registers the two ways a client can present its session.
struct SessionAuth;

impl Modify for SessionAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session"))),
        );
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

//=========================================================================================
// Shared Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/v1/ping",
    responses((status = 200, description = "Service is up", body = MessageResponse)),
    security(()),
    tag = "Study Notes API"
)]
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::new("pong"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/ping",
            "/user/create-user",
            "/note/{note_id}/flashcards",
            "/llm/generate-flashcard/{note_id}",
            "/quiz/submit-answer/{quiz_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = &doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("session_cookie"));
        assert!(schemes.contains_key("bearer"));
    }
}
