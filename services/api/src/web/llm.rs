//! services/api/src/web/llm.rs
//!
//! Endpoints that call out to the language model.

use crate::error::ApiError;
use crate::web::auth::{ApiJson, ApiPath, AuthUser};
use crate::web::notes::FlashcardResponse;
use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub note_id: Uuid,
    pub summary: String,
    pub language: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckAnswerRequest {
    pub question: Option<String>,
    pub correct_answer: Option<String>,
    pub user_answer: Option<String>,
    /// ISO 639-1 code for the feedback; defaults to `en`.
    pub language: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct JudgmentResponse {
    pub correct: bool,
    pub feedback: String,
}

#[utoipa::path(
    post,
    path = "/llm/generate-summary/{note_id}",
    params(("note_id" = Uuid, Path, description = "The note to summarize")),
    responses(
        (status = 200, description = "Summary generated and stored on the note", body = SummaryResponse),
        (status = 400, description = "Note has no content"),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found"),
        (status = 503, description = "The AI service failed")
    ),
    tag = "llm"
)]
pub async fn generate_summary(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.llm.generate_summary(auth.user_id, note_id).await?;
    Ok(Json(SummaryResponse {
        note_id,
        summary: summary.text,
        language: summary.language,
    }))
}

#[utoipa::path(
    post,
    path = "/llm/generate-flashcard/{note_id}",
    params(("note_id" = Uuid, Path, description = "The summarized note")),
    responses(
        (status = 201, description = "New flashcard set replacing the previous one", body = [FlashcardResponse]),
        (status = 400, description = "Note has no summary yet"),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found"),
        (status = 503, description = "The AI service failed or returned no cards")
    ),
    tag = "llm"
)]
pub async fn generate_flashcards(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cards = state.llm.generate_flashcards(auth.user_id, note_id).await?;
    let body: Vec<FlashcardResponse> = cards.into_iter().map(FlashcardResponse::from).collect();
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    post,
    path = "/llm/check-answer",
    request_body = CheckAnswerRequest,
    responses(
        (status = 200, description = "The judgment; nothing is recorded", body = JudgmentResponse),
        (status = 400, description = "Missing question, correct_answer or user_answer"),
        (status = 503, description = "The AI service failed")
    ),
    tag = "llm"
)]
pub async fn check_answer(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CheckAnswerRequest>,
) -> Result<Json<JudgmentResponse>, ApiError> {
    let judgment = state
        .llm
        .check_answer(
            req.question.as_deref(),
            req.correct_answer.as_deref(),
            req.user_answer.as_deref(),
            req.language.as_deref(),
        )
        .await?;
    Ok(Json(JudgmentResponse {
        correct: judgment.correct,
        feedback: judgment.feedback,
    }))
}
