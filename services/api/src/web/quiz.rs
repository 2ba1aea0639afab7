//! services/api/src/web/quiz.rs
//!
//! Quiz endpoints: start or resume, walk the cards, submit answers, read progress.

use crate::error::ApiError;
use crate::web::auth::{ApiJson, ApiPath, AuthUser};
use crate::web::state::AppState;
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_notes_core::domain::{Quiz, QuizProgress};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    pub id: Uuid,
    pub note_id: Uuid,
    /// One of `not_started`, `in_progress`, `completed`.
    pub state: String,
    pub flashcard_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Quiz> for QuizResponse {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            note_id: quiz.note_id,
            state: quiz.state.as_str().to_string(),
            flashcard_ids: quiz.flashcard_ids,
            created_at: quiz.created_at,
            completed_at: quiz.completed_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub quiz_id: Uuid,
    pub note_id: Uuid,
    pub state: String,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub remaining: usize,
    pub percent: f64,
}

impl From<QuizProgress> for ProgressResponse {
    fn from(progress: QuizProgress) -> Self {
        Self {
            quiz_id: progress.quiz_id,
            note_id: progress.note_id,
            state: progress.state.as_str().to_string(),
            total: progress.total,
            answered: progress.answered,
            correct: progress.correct,
            remaining: progress.remaining,
            percent: progress.percent,
        }
    }
}

/// A card as shown during a quiz; the answer stays hidden.
#[derive(Serialize, ToSchema)]
pub struct QuizCardResponse {
    pub id: Uuid,
    pub question: String,
    pub position: usize,
}

#[derive(Serialize, ToSchema)]
pub struct NextFlashcardResponse {
    pub quiz_id: Uuid,
    pub done: bool,
    pub flashcard: Option<QuizCardResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    pub flashcard_id: Uuid,
    pub answer: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    pub score_id: Uuid,
    pub flashcard_id: Uuid,
    pub correct: bool,
    pub feedback: String,
    pub progress: ProgressResponse,
}

#[utoipa::path(
    post,
    path = "/quiz/start/{note_id}",
    params(("note_id" = Uuid, Path, description = "The note to be quizzed on")),
    responses(
        (status = 200, description = "A new quiz, or the caller's unfinished one", body = QuizResponse),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found or it has no flashcards")
    ),
    tag = "quiz"
)]
pub async fn start_quiz(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = state.quizzes.start(auth.user_id, note_id).await?;
    Ok(Json(quiz.into()))
}

#[utoipa::path(
    get,
    path = "/quiz/progress/{note_id}",
    params(("note_id" = Uuid, Path, description = "The quizzed note")),
    responses(
        (status = 200, description = "Progress of the latest quiz on the note", body = ProgressResponse),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found or never quizzed")
    ),
    tag = "quiz"
)]
pub async fn quiz_progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state.quizzes.progress_for_note(auth.user_id, note_id).await?;
    Ok(Json(progress.into()))
}

#[utoipa::path(
    get,
    path = "/quiz/next/{quiz_id}",
    params(("quiz_id" = Uuid, Path, description = "The quiz")),
    responses(
        (status = 200, description = "The next unanswered card, if any", body = NextFlashcardResponse),
        (status = 403, description = "Not your quiz"),
        (status = 404, description = "Quiz not found")
    ),
    tag = "quiz"
)]
pub async fn next_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(quiz_id): ApiPath<Uuid>,
) -> Result<Json<NextFlashcardResponse>, ApiError> {
    let card = state.quizzes.next_flashcard(auth.user_id, quiz_id).await?;
    Ok(Json(NextFlashcardResponse {
        quiz_id,
        done: card.is_none(),
        flashcard: card.map(|c| QuizCardResponse {
            id: c.id,
            question: c.question,
            position: c.position,
        }),
    }))
}

#[utoipa::path(
    post,
    path = "/quiz/submit-answer/{quiz_id}",
    params(("quiz_id" = Uuid, Path, description = "The quiz being answered")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer graded and recorded", body = SubmitAnswerResponse),
        (status = 400, description = "Answer missing or flashcard not in this quiz"),
        (status = 403, description = "Not your quiz"),
        (status = 404, description = "Quiz not found"),
        (status = 409, description = "Flashcard already answered"),
        (status = 503, description = "The AI grader failed; nothing recorded")
    ),
    tag = "quiz"
)]
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(quiz_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    let outcome = state
        .quizzes
        .submit_answer(auth.user_id, quiz_id, req.flashcard_id, req.answer.as_deref())
        .await?;
    Ok(Json(SubmitAnswerResponse {
        score_id: outcome.score.id,
        flashcard_id: outcome.score.flashcard_id,
        correct: outcome.score.correct,
        feedback: outcome.score.feedback,
        progress: outcome.progress.into(),
    }))
}
