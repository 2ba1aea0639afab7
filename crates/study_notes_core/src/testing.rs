//! crates/study_notes_core/src/testing.rs
//!
//! In-memory implementations of every port. Compiled for this crate's tests and,
//! through the `test-utils` feature, for the tests of crates that depend on it.

use crate::domain::{
    AnswerJudgment, AuthSession, Flashcard, FlashcardDraft, NewScore, NewUser, Note, Quiz,
    QuizState, Score, Summary, User, UserCredentials,
};
use crate::messages;
use crate::ports::{
    AnswerCheckingService, CredentialHasher, DatabaseService, FlashcardGenerationService,
    PortError, PortResult, ResetNotifier, SummaryService,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

//=========================================================================================
// In-memory DatabaseService
//=========================================================================================

struct ResetToken {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, AuthSession>,
    reset_tokens: HashMap<String, ResetToken>,
    notes: Vec<Note>,
    flashcards: Vec<Flashcard>,
    quizzes: Vec<Quiz>,
    scores: Vec<Score>,
}

impl Tables {
    fn user_mut(&mut self, user_id: Uuid) -> PortResult<&mut UserCredentials> {
        self.users
            .iter_mut()
            .find(|c| c.user.id == user_id)
            .ok_or_else(|| PortError::NotFound(messages::USER_NOT_FOUND.to_string()))
    }

    fn note_mut(&mut self, note_id: Uuid) -> PortResult<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| PortError::NotFound(messages::NOTE_NOT_FOUND.to_string()))
    }

    fn ensure_unique(&self, user_id: Option<Uuid>, username: Option<&str>, email: Option<&str>) -> PortResult<()> {
        let others = self.users.iter().filter(|c| Some(c.user.id) != user_id);
        for other in others {
            if username == Some(other.user.username.as_str()) {
                return Err(PortError::Conflict(messages::USER_ALREADY_EXISTS.to_string()));
            }
            if email == Some(other.user.email.as_str()) {
                return Err(PortError::Conflict(messages::EMAIL_ALREADY_EXISTS.to_string()));
            }
        }
        Ok(())
    }

    fn drop_quizzes(&mut self, predicate: impl Fn(&Quiz) -> bool) {
        let doomed: Vec<Uuid> = self.quizzes.iter().filter(|q| predicate(q)).map(|q| q.id).collect();
        self.quizzes.retain(|q| !doomed.contains(&q.id));
        self.scores.retain(|s| !doomed.contains(&s.quiz_id));
    }

    fn drop_notes(&mut self, predicate: impl Fn(&Note) -> bool) {
        let doomed: Vec<Uuid> = self.notes.iter().filter(|n| predicate(n)).map(|n| n.id).collect();
        self.notes.retain(|n| !doomed.contains(&n.id));
        self.flashcards.retain(|f| !doomed.contains(&f.note_id));
        self.drop_quizzes(|q| doomed.contains(&q.note_id));
    }
}

/// A `DatabaseService` backed by plain collections behind a mutex.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory database poisoned".to_string()))
    }

    /// Grants admin rights, which the public API never does.
    pub fn make_admin(&self, user_id: Uuid) -> PortResult<()> {
        self.tables()?.user_mut(user_id)?.user.is_admin = true;
        Ok(())
    }

    /// Moves a session's expiry into the past.
    pub fn expire_session(&self, session_id: &str) -> PortResult<()> {
        if let Some(session) = self.tables()?.sessions.get_mut(session_id) {
            session.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
        Ok(())
    }

    pub fn session_count(&self, user_id: Uuid) -> usize {
        self.tables()
            .map(|t| t.sessions.values().filter(|s| s.user_id == user_id).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut tables = self.tables()?;
        tables.ensure_unique(None, Some(&new_user.username), Some(&new_user.email))?;
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            is_admin: false,
            created_at: Utc::now(),
        };
        tables.users.push(UserCredentials {
            user: user.clone(),
            hashed_password: new_user.hashed_password,
        });
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        Ok(self.get_credentials_by_id(user_id).await?.user)
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.tables()?
            .users
            .iter()
            .find(|c| c.user.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(messages::USER_NOT_FOUND.to_string()))
    }

    async fn get_credentials_by_id(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        self.tables()?
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(messages::USER_NOT_FOUND.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        self.tables()?
            .users
            .iter()
            .find(|c| c.user.email == email)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(messages::USER_NOT_FOUND.to_string()))
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        Ok(self.tables()?.users.iter().map(|c| c.user.clone()).collect())
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> PortResult<User> {
        let mut tables = self.tables()?;
        tables.ensure_unique(Some(user_id), username, email)?;
        let creds = tables.user_mut(user_id)?;
        if let Some(username) = username {
            creds.user.username = username.to_string();
        }
        if let Some(email) = email {
            creds.user.email = email.to_string();
        }
        Ok(creds.user.clone())
    }

    async fn update_password_hash(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        self.tables()?.user_mut(user_id)?.hashed_password = hashed_password.to_string();
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        tables.user_mut(user_id)?;
        tables.users.retain(|c| c.user.id != user_id);
        tables.sessions.retain(|_, s| s.user_id != user_id);
        tables.reset_tokens.retain(|_, t| t.user_id != user_id);
        tables.drop_notes(|n| n.owner_id == user_id);
        tables.drop_quizzes(|q| q.user_id == user_id);
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession> {
        let session = AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        };
        self.tables()?
            .sessions
            .insert(session_id.to_string(), session.clone());
        Ok(session)
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.tables()?
            .sessions
            .get(session_id)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.user_id)
            .ok_or_else(|| PortError::Unauthorized(messages::SESSION_INVALID.to_string()))
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables()?.sessions.remove(session_id);
        Ok(())
    }

    async fn delete_auth_sessions_for_user(
        &self,
        user_id: Uuid,
        keep: Option<&str>,
    ) -> PortResult<()> {
        self.tables()?
            .sessions
            .retain(|id, s| s.user_id != user_id || Some(id.as_str()) == keep);
        Ok(())
    }

    async fn create_reset_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.tables()?.reset_tokens.insert(
            token.to_string(),
            ResetToken {
                user_id,
                expires_at,
                used: false,
            },
        );
        Ok(())
    }

    async fn consume_reset_token(&self, token: &str) -> PortResult<Uuid> {
        let mut tables = self.tables()?;
        match tables.reset_tokens.get_mut(token) {
            Some(t) if !t.used && t.expires_at > Utc::now() => {
                t.used = true;
                Ok(t.user_id)
            }
            _ => Err(PortError::NotFound(messages::EXPIRED_INVALID_TOKEN.to_string())),
        }
    }

    async fn create_note(&self, owner_id: Uuid, title: &str, content: &str) -> PortResult<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            content: content.to_string(),
            summary: None,
            language: None,
            created_at: now,
            updated_at: now,
        };
        self.tables()?.notes.push(note.clone());
        Ok(note)
    }

    async fn get_note(&self, note_id: Uuid) -> PortResult<Note> {
        Ok(self.tables()?.note_mut(note_id)?.clone())
    }

    async fn list_notes_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .tables()?
            .notes
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        notes.reverse();
        Ok(notes)
    }

    async fn update_note(
        &self,
        note_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> PortResult<Note> {
        let mut tables = self.tables()?;
        let note = tables.note_mut(note_id)?;
        if let Some(title) = title {
            note.title = title.to_string();
        }
        if let Some(content) = content {
            note.content = content.to_string();
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        tables.note_mut(note_id)?;
        tables.drop_notes(|n| n.id == note_id);
        Ok(())
    }

    async fn save_summary(&self, note_id: Uuid, summary: &Summary) -> PortResult<Note> {
        let mut tables = self.tables()?;
        let note = tables.note_mut(note_id)?;
        note.summary = Some(summary.text.clone());
        note.language = Some(summary.language.clone());
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn replace_flashcards(
        &self,
        note_id: Uuid,
        drafts: &[FlashcardDraft],
    ) -> PortResult<Vec<Flashcard>> {
        let mut tables = self.tables()?;
        tables.note_mut(note_id)?;
        tables.drop_quizzes(|q| q.note_id == note_id);
        tables.flashcards.retain(|f| f.note_id != note_id);
        let now = Utc::now();
        let cards: Vec<Flashcard> = drafts
            .iter()
            .enumerate()
            .map(|(position, d)| Flashcard {
                id: Uuid::new_v4(),
                note_id,
                question: d.question.clone(),
                answer: d.answer.clone(),
                position,
                created_at: now,
            })
            .collect();
        tables.flashcards.extend(cards.iter().cloned());
        Ok(cards)
    }

    async fn list_flashcards_for_note(&self, note_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let mut cards: Vec<Flashcard> = self
            .tables()?
            .flashcards
            .iter()
            .filter(|f| f.note_id == note_id)
            .cloned()
            .collect();
        cards.sort_by_key(|f| f.position);
        Ok(cards)
    }

    async fn list_flashcards_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let tables = self.tables()?;
        let owned: Vec<Uuid> = tables
            .notes
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .map(|n| n.id)
            .collect();
        Ok(tables
            .flashcards
            .iter()
            .filter(|f| owned.contains(&f.note_id))
            .cloned()
            .collect())
    }

    async fn delete_flashcards_for_note(&self, note_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        tables.drop_quizzes(|q| q.note_id == note_id);
        tables.flashcards.retain(|f| f.note_id != note_id);
        Ok(())
    }

    async fn create_quiz(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        flashcard_ids: &[Uuid],
    ) -> PortResult<Quiz> {
        let quiz = Quiz {
            id: Uuid::new_v4(),
            note_id,
            user_id,
            flashcard_ids: flashcard_ids.to_vec(),
            state: QuizState::NotStarted,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.tables()?.quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn get_quiz(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        self.tables()?
            .quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(messages::QUIZ_NOT_FOUND.to_string()))
    }

    async fn latest_quiz(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        active_only: bool,
    ) -> PortResult<Option<Quiz>> {
        Ok(self
            .tables()?
            .quizzes
            .iter()
            .rev()
            .find(|q| {
                q.user_id == user_id
                    && q.note_id == note_id
                    && (!active_only || q.state != QuizState::Completed)
            })
            .cloned())
    }

    async fn record_score(&self, score: NewScore) -> PortResult<(Score, Quiz)> {
        let mut tables = self.tables()?;
        if tables
            .scores
            .iter()
            .any(|s| s.quiz_id == score.quiz_id && s.flashcard_id == score.flashcard_id)
        {
            return Err(PortError::Conflict(
                messages::FLASHCARD_ALREADY_ANSWERED.to_string(),
            ));
        }
        let recorded = Score {
            id: Uuid::new_v4(),
            quiz_id: score.quiz_id,
            flashcard_id: score.flashcard_id,
            given_answer: score.given_answer,
            correct: score.judgment.correct,
            feedback: score.judgment.feedback,
            answered_at: Utc::now(),
        };
        tables.scores.push(recorded.clone());
        let answered = tables
            .scores
            .iter()
            .filter(|s| s.quiz_id == score.quiz_id)
            .count();
        let quiz = tables
            .quizzes
            .iter_mut()
            .find(|q| q.id == score.quiz_id)
            .ok_or_else(|| PortError::NotFound(messages::QUIZ_NOT_FOUND.to_string()))?;
        quiz.state = QuizState::after_answers(answered, quiz.flashcard_ids.len());
        if quiz.state == QuizState::Completed {
            quiz.completed_at = Some(recorded.answered_at);
        }
        Ok((recorded, quiz.clone()))
    }

    async fn list_scores(&self, quiz_id: Uuid) -> PortResult<Vec<Score>> {
        Ok(self
            .tables()?
            .scores
            .iter()
            .filter(|s| s.quiz_id == quiz_id)
            .cloned()
            .collect())
    }
}

//=========================================================================================
// AI fakes
//=========================================================================================

/// Summarizes by echoing the first sentence of the content; reports English.
#[derive(Default)]
pub struct FakeSummarizer {
    pub fail: bool,
}

#[async_trait]
impl SummaryService for FakeSummarizer {
    async fn summarize(&self, content: &str) -> PortResult<Summary> {
        if self.fail {
            return Err(PortError::Unavailable("summarizer offline".to_string()));
        }
        let first = content.split('.').next().unwrap_or(content).trim();
        Ok(Summary {
            text: format!("Summary: {first}."),
            language: "en".to_string(),
        })
    }
}

/// Returns `cards` verbatim, or two cards derived from the summary when empty
/// and `return_nothing` is unset.
#[derive(Default)]
pub struct FakeFlashcardGenerator {
    pub cards: Vec<FlashcardDraft>,
    pub return_nothing: bool,
    pub fail: bool,
}

#[async_trait]
impl FlashcardGenerationService for FakeFlashcardGenerator {
    async fn generate_flashcards(
        &self,
        summary: &str,
        _language: &str,
    ) -> PortResult<Vec<FlashcardDraft>> {
        if self.fail {
            return Err(PortError::Unavailable("generator offline".to_string()));
        }
        if self.return_nothing {
            return Ok(Vec::new());
        }
        if !self.cards.is_empty() {
            return Ok(self.cards.clone());
        }
        Ok(vec![
            FlashcardDraft {
                question: "What is the summary about?".to_string(),
                answer: summary.to_string(),
            },
            FlashcardDraft {
                question: "What is two plus two?".to_string(),
                answer: "four".to_string(),
            },
        ])
    }
}

/// Accepts an answer when it equals the expected one, ignoring case and surrounding spaces.
#[derive(Default)]
pub struct FakeAnswerChecker {
    pub fail: bool,
}

#[async_trait]
impl AnswerCheckingService for FakeAnswerChecker {
    async fn check_answer(
        &self,
        _question: &str,
        expected: &str,
        given: &str,
        _language: &str,
    ) -> PortResult<AnswerJudgment> {
        if self.fail {
            return Err(PortError::Unavailable("grader offline".to_string()));
        }
        let correct = expected.trim().eq_ignore_ascii_case(given.trim());
        let feedback = if correct {
            "Correct!".to_string()
        } else {
            format!("Not quite. Expected: {expected}")
        };
        Ok(AnswerJudgment { correct, feedback })
    }
}

//=========================================================================================
// Credential and notification fakes
//=========================================================================================

/// Stores passwords with a visible prefix instead of a real hash.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain${password}"))
    }

    fn verify_password(&self, password: &str, hashed_password: &str) -> PortResult<bool> {
        Ok(hashed_password.strip_prefix("plain$") == Some(password))
    }
}

/// Keeps every reset link it was asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// `(email, link)` pairs in delivery order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn send_reset_link(&self, email: &str, reset_link: &str) -> PortResult<()> {
        self.sent
            .lock()
            .map_err(|_| PortError::Unexpected("notifier poisoned".to_string()))?
            .push((email.to_string(), reset_link.to_string()));
        Ok(())
    }
}
