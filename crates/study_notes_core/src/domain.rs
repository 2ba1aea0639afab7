//! crates/study_notes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login and password changes - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// The fields needed to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A user-authored note and, once generated, its AI summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    /// Language reported alongside the summary (e.g. "en").
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The AI-generated condensation of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub language: String,
}

/// A question/answer pair as returned by the flashcard generator, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardDraft {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub id: Uuid,
    pub note_id: Uuid,
    pub question: String,
    pub answer: String,
    pub position: usize,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    InProgress,
    Completed,
}

impl QuizState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizState::NotStarted => "not_started",
            QuizState::InProgress => "in_progress",
            QuizState::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_started" => Some(QuizState::NotStarted),
            "in_progress" => Some(QuizState::InProgress),
            "completed" => Some(QuizState::Completed),
            _ => None,
        }
    }

    /// The state a quiz is in once `answered` of its `total` flashcards carry a score.
    pub fn after_answers(answered: usize, total: usize) -> Self {
        if answered == 0 {
            QuizState::NotStarted
        } else if answered >= total {
            QuizState::Completed
        } else {
            QuizState::InProgress
        }
    }
}

/// A review session over a fixed set of a note's flashcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub id: Uuid,
    pub note_id: Uuid,
    pub user_id: Uuid,
    /// Captured from the note when the quiz starts, in presentation order.
    pub flashcard_ids: Vec<Uuid>,
    pub state: QuizState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn contains(&self, flashcard_id: Uuid) -> bool {
        self.flashcard_ids.contains(&flashcard_id)
    }
}

/// The grader's verdict on a single answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerJudgment {
    pub correct: bool,
    pub feedback: String,
}

#[derive(Debug, Clone)]
pub struct NewScore {
    pub quiz_id: Uuid,
    pub flashcard_id: Uuid,
    pub given_answer: String,
    pub judgment: AnswerJudgment,
}

/// One answered flashcard within a quiz attempt. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub flashcard_id: Uuid,
    pub given_answer: String,
    pub correct: bool,
    pub feedback: String,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizProgress {
    pub quiz_id: Uuid,
    pub note_id: Uuid,
    pub state: QuizState,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub remaining: usize,
    pub percent: f64,
}

impl QuizProgress {
    pub fn from_scores(quiz: &Quiz, scores: &[Score]) -> Self {
        let total = quiz.flashcard_ids.len();
        let answered = scores.len();
        let correct = scores.iter().filter(|s| s.correct).count();
        let percent = if total == 0 {
            0.0
        } else {
            ((answered as f64 / total as f64) * 10_000.0).round() / 100.0
        };
        Self {
            quiz_id: quiz.id,
            note_id: quiz.note_id,
            state: quiz.state,
            total,
            answered,
            correct,
            remaining: total.saturating_sub(answered),
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_state_follows_answer_count() {
        assert_eq!(QuizState::after_answers(0, 3), QuizState::NotStarted);
        assert_eq!(QuizState::after_answers(1, 3), QuizState::InProgress);
        assert_eq!(QuizState::after_answers(2, 3), QuizState::InProgress);
        assert_eq!(QuizState::after_answers(3, 3), QuizState::Completed);
    }

    #[test]
    fn quiz_state_round_trips_through_its_column_value() {
        for state in [QuizState::NotStarted, QuizState::InProgress, QuizState::Completed] {
            assert_eq!(QuizState::parse(state.as_str()), Some(state));
        }
        assert_eq!(QuizState::parse("paused"), None);
    }

    #[test]
    fn progress_counts_correct_and_remaining() {
        let now = Utc::now();
        let cards = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let quiz = Quiz {
            id: Uuid::new_v4(),
            note_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            flashcard_ids: cards.clone(),
            state: QuizState::InProgress,
            created_at: now,
            completed_at: None,
        };
        let score = |flashcard_id, correct| Score {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            flashcard_id,
            given_answer: "x".to_string(),
            correct,
            feedback: String::new(),
            answered_at: now,
        };
        let scores = vec![score(cards[0], true), score(cards[1], false)];

        let progress = QuizProgress::from_scores(&quiz, &scores);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.correct, 1);
        assert_eq!(progress.remaining, 1);
        assert_eq!(progress.percent, 66.67);
    }
}
