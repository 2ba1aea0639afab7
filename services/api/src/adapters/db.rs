//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use study_notes_core::domain::{
    AuthSession, Flashcard, FlashcardDraft, NewScore, NewUser, Note, Quiz, QuizState, Score,
    Summary, User, UserCredentials,
};
use study_notes_core::messages;
use study_notes_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn begin(&self) -> PortResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(unexpected)
    }
}

//=========================================================================================
// Error Translation
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a missing row to `NotFound(message)` and unique violations to `Conflict`.
fn map_err(message: &str) -> impl Fn(sqlx::Error) -> PortError + '_ {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(message.to_string()),
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            let conflict = match db.constraint() {
                Some("users_username_key") => messages::USER_ALREADY_EXISTS,
                Some("users_email_key") => messages::EMAIL_ALREADY_EXISTS,
                Some("scores_quiz_flashcard_key") => messages::FLASHCARD_ALREADY_ANSWERED,
                _ => "Resource already exists.",
            };
            PortError::Conflict(conflict.to_string())
        }
        other => unexpected(other),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    username: String,
    email: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                username: self.username,
                email: self.email,
                is_admin: self.is_admin,
                created_at: self.created_at,
            },
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}
impl AuthSessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            id: self.id,
            user_id: self.user_id,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    content: String,
    summary: Option<String>,
    language: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            summary: self.summary,
            language: self.language,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct FlashcardRecord {
    id: Uuid,
    note_id: Uuid,
    question: String,
    answer: String,
    position: i32,
    created_at: DateTime<Utc>,
}
impl FlashcardRecord {
    fn to_domain(self) -> Flashcard {
        Flashcard {
            id: self.id,
            note_id: self.note_id,
            question: self.question,
            answer: self.answer,
            position: self.position.max(0) as usize,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    note_id: Uuid,
    user_id: Uuid,
    state: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}
impl QuizRecord {
    fn to_domain(self, flashcard_ids: Vec<Uuid>) -> PortResult<Quiz> {
        let state = QuizState::parse(&self.state).ok_or_else(|| {
            PortError::Unexpected(format!("Quiz {} has unknown state '{}'", self.id, self.state))
        })?;
        Ok(Quiz {
            id: self.id,
            note_id: self.note_id,
            user_id: self.user_id,
            flashcard_ids,
            state,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(FromRow)]
struct ScoreRecord {
    id: Uuid,
    quiz_id: Uuid,
    flashcard_id: Uuid,
    given_answer: String,
    correct: bool,
    feedback: String,
    answered_at: DateTime<Utc>,
}
impl ScoreRecord {
    fn to_domain(self) -> Score {
        Score {
            id: self.id,
            quiz_id: self.quiz_id,
            flashcard_id: self.flashcard_id,
            given_answer: self.given_answer,
            correct: self.correct,
            feedback: self.feedback,
            answered_at: self.answered_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, is_admin, created_at";
const CREDENTIAL_COLUMNS: &str = "id, username, email, is_admin, created_at, password_hash";
const NOTE_COLUMNS: &str =
    "id, owner_id, title, content, summary, language, created_at, updated_at";
const FLASHCARD_COLUMNS: &str = "id, note_id, question, answer, position, created_at";
const QUIZ_COLUMNS: &str = "id, note_id, user_id, state, created_at, completed_at";
const SCORE_COLUMNS: &str =
    "id, quiz_id, flashcard_id, given_answer, correct, feedback, answered_at";

//=========================================================================================
// Quiz helpers shared by the pool and transaction paths
//=========================================================================================

async fn quiz_flashcard_ids<'e, E>(executor: E, quiz_id: Uuid) -> PortResult<Vec<Uuid>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, Uuid>(
        "SELECT flashcard_id FROM quiz_flashcards WHERE quiz_id = $1 ORDER BY position ASC",
    )
    .bind(quiz_id)
    .fetch_all(executor)
    .await
    .map_err(unexpected)
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users ---

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::USER_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::USER_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::USER_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_id(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::USER_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::USER_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET username = COALESCE($2, username), email = COALESCE($3, email) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::USER_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn update_password_hash(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(hashed_password)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(messages::USER_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        // Notes, flashcards, quizzes, scores and sessions go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(messages::USER_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    // --- Auth Sessions ---

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING id, user_id, expires_at",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::Unauthorized(messages::SESSION_INVALID.to_string()))
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_auth_sessions_for_user(
        &self,
        user_id: Uuid,
        keep: Option<&str>,
    ) -> PortResult<()> {
        sqlx::query(
            "DELETE FROM auth_sessions WHERE user_id = $1 AND ($2::TEXT IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    // --- Password Reset Tokens ---

    async fn create_reset_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn consume_reset_token(&self, token: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE password_reset_tokens SET used_at = NOW() \
             WHERE token = $1 AND used_at IS NULL AND expires_at > NOW() \
             RETURNING user_id",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(messages::EXPIRED_INVALID_TOKEN.to_string()))
    }

    // --- Notes ---

    async fn create_note(&self, owner_id: Uuid, title: &str, content: &str) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "INSERT INTO notes (id, owner_id, title, content) VALUES ($1, $2, $3, $4) RETURNING {NOTE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_note(&self, note_id: Uuid) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1"
        ))
        .bind(note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::NOTE_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn list_notes_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_note(
        &self,
        note_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "UPDATE notes SET title = COALESCE($2, title), content = COALESCE($3, content), \
             updated_at = NOW() WHERE id = $1 RETURNING {NOTE_COLUMNS}"
        ))
        .bind(note_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::NOTE_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(messages::NOTE_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    async fn save_summary(&self, note_id: Uuid, summary: &Summary) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "UPDATE notes SET summary = $2, language = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {NOTE_COLUMNS}"
        ))
        .bind(note_id)
        .bind(&summary.text)
        .bind(&summary.language)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::NOTE_NOT_FOUND))?;
        Ok(record.to_domain())
    }

    // --- Flashcards ---

    async fn replace_flashcards(
        &self,
        note_id: Uuid,
        drafts: &[FlashcardDraft],
    ) -> PortResult<Vec<Flashcard>> {
        let mut tx = self.begin().await?;

        // Quizzes over the old set would point at cards that no longer exist.
        sqlx::query("DELETE FROM quizzes WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        sqlx::query("DELETE FROM flashcards WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let mut cards = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.iter().enumerate() {
            let record = sqlx::query_as::<_, FlashcardRecord>(&format!(
                "INSERT INTO flashcards (id, note_id, question, answer, position) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {FLASHCARD_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(note_id)
            .bind(&draft.question)
            .bind(&draft.answer)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
            cards.push(record.to_domain());
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(cards)
    }

    async fn list_flashcards_for_note(&self, note_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let records = sqlx::query_as::<_, FlashcardRecord>(&format!(
            "SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE note_id = $1 ORDER BY position ASC"
        ))
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_flashcards_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let records = sqlx::query_as::<_, FlashcardRecord>(
            "SELECT f.id, f.note_id, f.question, f.answer, f.position, f.created_at \
             FROM flashcards f JOIN notes n ON n.id = f.note_id \
             WHERE n.owner_id = $1 ORDER BY n.created_at ASC, f.position ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_flashcards_for_note(&self, note_id: Uuid) -> PortResult<()> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM quizzes WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        sqlx::query("DELETE FROM flashcards WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)
    }

    // --- Quizzes and Scores ---

    async fn create_quiz(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        flashcard_ids: &[Uuid],
    ) -> PortResult<Quiz> {
        let mut tx = self.begin().await?;
        let record = sqlx::query_as::<_, QuizRecord>(&format!(
            "INSERT INTO quizzes (id, note_id, user_id, state) VALUES ($1, $2, $3, $4) RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(note_id)
        .bind(user_id)
        .bind(QuizState::NotStarted.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        for (position, flashcard_id) in flashcard_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quiz_flashcards (quiz_id, flashcard_id, position) VALUES ($1, $2, $3)",
            )
            .bind(record.id)
            .bind(flashcard_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        record.to_domain(flashcard_ids.to_vec())
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err(messages::QUIZ_NOT_FOUND))?;
        let ids = quiz_flashcard_ids(&self.pool, record.id).await?;
        record.to_domain(ids)
    }

    async fn latest_quiz(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        active_only: bool,
    ) -> PortResult<Option<Quiz>> {
        let record = sqlx::query_as::<_, QuizRecord>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes \
             WHERE user_id = $1 AND note_id = $2 AND (NOT $3 OR state <> 'completed') \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(note_id)
        .bind(active_only)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => {
                let ids = quiz_flashcard_ids(&self.pool, record.id).await?;
                Ok(Some(record.to_domain(ids)?))
            }
            None => Ok(None),
        }
    }

    async fn record_score(&self, score: NewScore) -> PortResult<(Score, Quiz)> {
        let mut tx = self.begin().await?;

        // Serializes concurrent answers to the same quiz.
        sqlx::query("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
            .bind(score.quiz_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_err(messages::QUIZ_NOT_FOUND))?;

        let recorded = sqlx::query_as::<_, ScoreRecord>(&format!(
            "INSERT INTO scores (id, quiz_id, flashcard_id, given_answer, correct, feedback) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SCORE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(score.quiz_id)
        .bind(score.flashcard_id)
        .bind(&score.given_answer)
        .bind(score.judgment.correct)
        .bind(&score.judgment.feedback)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_err(messages::QUIZ_NOT_FOUND))?
        .to_domain();

        let answered: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scores WHERE quiz_id = $1")
            .bind(score.quiz_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
        let flashcard_ids = quiz_flashcard_ids(&mut *tx, score.quiz_id).await?;
        let state = QuizState::after_answers(answered as usize, flashcard_ids.len());

        let record = sqlx::query_as::<_, QuizRecord>(&format!(
            "UPDATE quizzes SET state = $2, \
             completed_at = CASE WHEN $2 = 'completed' THEN NOW() ELSE completed_at END \
             WHERE id = $1 RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(score.quiz_id)
        .bind(state.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok((recorded, record.to_domain(flashcard_ids)?))
    }

    async fn list_scores(&self, quiz_id: Uuid) -> PortResult<Vec<Score>> {
        let records = sqlx::query_as::<_, ScoreRecord>(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE quiz_id = $1 ORDER BY answered_at ASC"
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
