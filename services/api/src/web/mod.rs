pub mod auth;
pub mod llm;
pub mod middleware;
pub mod notes;
pub mod quiz;
pub mod rest;
pub mod state;
pub mod users;

pub use middleware::require_auth;
pub use state::{Adapters, AppState};

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Builds every API route. Cross-cutting layers (CORS, tracing, docs) are added by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/v1/ping", get(rest::ping))
        .route("/user/create-user", post(users::create_user))
        .route("/user/login", post(users::login))
        .route("/user/request-password-reset", post(users::request_password_reset))
        .route("/user/password-reset", post(users::reset_password));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/user/logout", post(users::logout))
        .route("/user/get-user/{user_id}", get(users::get_user))
        .route("/user/update-user/{user_id}", put(users::update_user))
        .route("/user/delete-user/{user_id}", delete(users::delete_user))
        .route("/user/list-users", get(users::list_users))
        .route("/user/fetch-flashcards/{user_id}", get(users::fetch_flashcards))
        .route("/user/change-password/{user_id}", post(users::change_password))
        .route("/note/store-note", post(notes::store_note))
        .route("/note/get-notes", get(notes::get_notes))
        .route("/note/get-note/{note_id}", get(notes::get_note))
        .route("/note/update-note/{note_id}", put(notes::update_note))
        .route("/note/delete-note/{note_id}", delete(notes::delete_note))
        .route(
            "/note/{note_id}/flashcards",
            get(notes::list_flashcards).delete(notes::delete_flashcards),
        )
        .route("/llm/generate-summary/{note_id}", post(llm::generate_summary))
        .route("/llm/generate-flashcard/{note_id}", post(llm::generate_flashcards))
        .route("/llm/check-answer", post(llm::check_answer))
        .route("/quiz/start/{note_id}", post(quiz::start_quiz))
        .route("/quiz/progress/{note_id}", get(quiz::quiz_progress))
        .route("/quiz/next/{quiz_id}", get(quiz::next_flashcard))
        .route("/quiz/submit-answer/{quiz_id}", post(quiz::submit_answer))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
