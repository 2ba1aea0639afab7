//! services/api/src/web/notes.rs
//!
//! Note CRUD and the per-note flashcard listing.

use crate::error::ApiError;
use crate::web::auth::{ApiJson, ApiPath, AuthUser};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_notes_core::domain::{Flashcard, Note};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct NoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct NoteResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            owner_id: note.owner_id,
            title: note.title,
            content: note.content,
            summary: note.summary,
            language: note.language,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardResponse {
    pub id: Uuid,
    pub note_id: Uuid,
    pub question: String,
    pub answer: String,
    pub position: usize,
    pub created_at: DateTime<Utc>,
}

impl From<Flashcard> for FlashcardResponse {
    fn from(card: Flashcard) -> Self {
        Self {
            id: card.id,
            note_id: card.note_id,
            question: card.question,
            answer: card.answer,
            position: card.position,
            created_at: card.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/note/store-note",
    request_body = NoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Title or content missing")
    ),
    tag = "notes"
)]
pub async fn store_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<NoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .create(auth.user_id, req.title.as_deref(), req.content.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

#[utoipa::path(
    get,
    path = "/note/get-notes",
    responses((status = 200, description = "The caller's notes, newest first", body = [NoteResponse])),
    tag = "notes"
)]
pub async fn get_notes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let notes = state.notes.list(auth.user_id).await?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/note/get-note/{note_id}",
    params(("note_id" = Uuid, Path, description = "The note to read")),
    responses(
        (status = 200, description = "The note", body = NoteResponse),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes"
)]
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = state.notes.get(auth.user_id, note_id).await?;
    Ok(Json(note.into()))
}

#[utoipa::path(
    put,
    path = "/note/update-note/{note_id}",
    params(("note_id" = Uuid, Path, description = "The note to update")),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "The updated note", body = NoteResponse),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes"
)]
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<NoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = state
        .notes
        .update(
            auth.user_id,
            note_id,
            req.title.as_deref(),
            req.content.as_deref(),
        )
        .await?;
    Ok(Json(note.into()))
}

#[utoipa::path(
    delete,
    path = "/note/delete-note/{note_id}",
    params(("note_id" = Uuid, Path, description = "The note to delete")),
    responses(
        (status = 200, description = "Note deleted with its flashcards and quizzes", body = MessageResponse),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes"
)]
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.notes.delete(auth.user_id, note_id).await?;
    Ok(Json(MessageResponse::new("Note deleted successfully.")))
}

#[utoipa::path(
    get,
    path = "/note/{note_id}/flashcards",
    params(("note_id" = Uuid, Path, description = "The note whose flashcards to list")),
    responses(
        (status = 200, description = "Flashcards in order", body = [FlashcardResponse]),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes"
)]
pub async fn list_flashcards(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<Vec<FlashcardResponse>>, ApiError> {
    let cards = state.flashcards.list_for_note(auth.user_id, note_id).await?;
    Ok(Json(cards.into_iter().map(FlashcardResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/note/{note_id}/flashcards",
    params(("note_id" = Uuid, Path, description = "The note whose flashcards to delete")),
    responses(
        (status = 200, description = "Flashcards and quizzes over them deleted", body = MessageResponse),
        (status = 403, description = "Not your note"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes"
)]
pub async fn delete_flashcards(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(note_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.flashcards.delete_for_note(auth.user_id, note_id).await?;
    Ok(Json(MessageResponse::new("Flashcards deleted successfully.")))
}
