//! crates/study_notes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    AnswerJudgment, AuthSession, Flashcard, FlashcardDraft, NewScore, NewUser, Note, Quiz, Score,
    Summary, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and service operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    /// The external AI service failed or returned something unusable.
    #[error("Upstream service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `Conflict` when the username or email is already taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn get_credentials_by_id(&self, user_id: Uuid) -> PortResult<UserCredentials>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn update_user(
        &self,
        user_id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> PortResult<User>;

    async fn update_password_hash(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    /// Removes the user together with everything they own.
    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession>;

    /// Returns the owning user id, or `Unauthorized` for unknown or expired sessions.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    /// Revokes every session of a user except `keep`.
    async fn delete_auth_sessions_for_user(
        &self,
        user_id: Uuid,
        keep: Option<&str>,
    ) -> PortResult<()>;

    // --- Password Reset Tokens ---
    async fn create_reset_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Marks the token used and returns its user. Unknown, used or expired tokens
    /// yield `NotFound`.
    async fn consume_reset_token(&self, token: &str) -> PortResult<Uuid>;

    // --- Notes ---
    async fn create_note(&self, owner_id: Uuid, title: &str, content: &str) -> PortResult<Note>;

    async fn get_note(&self, note_id: Uuid) -> PortResult<Note>;

    /// Newest first.
    async fn list_notes_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Note>>;

    async fn update_note(
        &self,
        note_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> PortResult<Note>;

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()>;

    async fn save_summary(&self, note_id: Uuid, summary: &Summary) -> PortResult<Note>;

    // --- Flashcards ---
    /// Atomically drops the note's previous flashcards (and any quiz over them)
    /// and stores `drafts` with fresh ids.
    async fn replace_flashcards(
        &self,
        note_id: Uuid,
        drafts: &[FlashcardDraft],
    ) -> PortResult<Vec<Flashcard>>;

    async fn list_flashcards_for_note(&self, note_id: Uuid) -> PortResult<Vec<Flashcard>>;

    async fn list_flashcards_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<Flashcard>>;

    async fn delete_flashcards_for_note(&self, note_id: Uuid) -> PortResult<()>;

    // --- Quizzes and Scores ---
    async fn create_quiz(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        flashcard_ids: &[Uuid],
    ) -> PortResult<Quiz>;

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz>;

    /// The most recent quiz of the user on the note, optionally restricted to
    /// quizzes that are not yet completed.
    async fn latest_quiz(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        active_only: bool,
    ) -> PortResult<Option<Quiz>>;

    /// Appends a score and moves the quiz to the state implied by its answer count
    /// in one transaction. A second score for the same flashcard yields `Conflict`.
    async fn record_score(&self, score: NewScore) -> PortResult<(Score, Quiz)>;

    async fn list_scores(&self, quiz_id: Uuid) -> PortResult<Vec<Score>>;
}

//=========================================================================================
// AI Ports
//=========================================================================================

#[async_trait]
pub trait SummaryService: Send + Sync {
    /// Condenses note content and reports the language it was written in.
    async fn summarize(&self, content: &str) -> PortResult<Summary>;
}

#[async_trait]
pub trait FlashcardGenerationService: Send + Sync {
    /// Derives question/answer pairs from a summary.
    async fn generate_flashcards(
        &self,
        summary: &str,
        language: &str,
    ) -> PortResult<Vec<FlashcardDraft>>;
}

#[async_trait]
pub trait AnswerCheckingService: Send + Sync {
    /// Judges whether `given` answers `question` as well as `expected` does.
    async fn check_answer(
        &self,
        question: &str,
        expected: &str,
        given: &str,
        language: &str,
    ) -> PortResult<AnswerJudgment>;
}

//=========================================================================================
// Credential and Notification Ports
//=========================================================================================

pub trait CredentialHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> PortResult<String>;

    fn verify_password(&self, password: &str, hashed_password: &str) -> PortResult<bool>;
}

#[async_trait]
pub trait ResetNotifier: Send + Sync {
    /// Delivers a password-reset link to the given address.
    async fn send_reset_link(&self, email: &str, reset_link: &str) -> PortResult<()>;
}
