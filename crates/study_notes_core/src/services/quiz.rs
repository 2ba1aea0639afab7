//! crates/study_notes_core/src/services/quiz.rs
//!
//! Quiz sessions over a note's flashcards.
//!
//! A quiz captures the note's flashcard ids when it starts and moves through
//! `NotStarted -> InProgress -> Completed` as scores are recorded. The state
//! change happens in the same persistence call that appends the score.

use crate::domain::{Flashcard, NewScore, Quiz, QuizProgress, Score};
use crate::messages;
use crate::ports::{AnswerCheckingService, DatabaseService, PortError, PortResult};
use crate::services::llm::{upstream, DEFAULT_LANGUAGE};
use crate::services::{ensure_note_owner, required};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// What a caller gets back after answering one flashcard.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub score: Score,
    pub quiz: Quiz,
    pub progress: QuizProgress,
}

#[derive(Clone)]
pub struct QuizService {
    db: Arc<dyn DatabaseService>,
    grader: Arc<dyn AnswerCheckingService>,
}

impl QuizService {
    pub fn new(db: Arc<dyn DatabaseService>, grader: Arc<dyn AnswerCheckingService>) -> Self {
        Self { db, grader }
    }

    /// Resumes the user's unfinished quiz on the note, or starts a new one over
    /// all of the note's current flashcards.
    pub async fn start(&self, requester: Uuid, note_id: Uuid) -> PortResult<Quiz> {
        let note = self.db.get_note(note_id).await?;
        ensure_note_owner(&note, requester)?;

        if let Some(active) = self.db.latest_quiz(requester, note_id, true).await? {
            debug!(quiz_id = %active.id, "Resuming active quiz");
            return Ok(active);
        }

        let cards = self.db.list_flashcards_for_note(note_id).await?;
        if cards.is_empty() {
            return Err(PortError::NotFound(messages::NO_FLASHCARDS_FOR_NOTE.to_string()));
        }
        let ids: Vec<Uuid> = cards.iter().map(|c| c.id).collect();
        let quiz = self.db.create_quiz(requester, note_id, &ids).await?;
        info!(quiz_id = %quiz.id, %note_id, cards = ids.len(), "Started quiz");
        Ok(quiz)
    }

    pub async fn progress(&self, requester: Uuid, quiz_id: Uuid) -> PortResult<QuizProgress> {
        let quiz = self.owned_quiz(requester, quiz_id).await?;
        let scores = self.db.list_scores(quiz.id).await?;
        Ok(QuizProgress::from_scores(&quiz, &scores))
    }

    /// Progress of the most recent quiz the user took on the note.
    pub async fn progress_for_note(
        &self,
        requester: Uuid,
        note_id: Uuid,
    ) -> PortResult<QuizProgress> {
        let note = self.db.get_note(note_id).await?;
        ensure_note_owner(&note, requester)?;
        let quiz = self
            .db
            .latest_quiz(requester, note_id, false)
            .await?
            .ok_or_else(|| PortError::NotFound(messages::NO_QUIZ_FOR_NOTE.to_string()))?;
        let scores = self.db.list_scores(quiz.id).await?;
        Ok(QuizProgress::from_scores(&quiz, &scores))
    }

    /// The first flashcard of the quiz that has no score yet.
    pub async fn next_flashcard(
        &self,
        requester: Uuid,
        quiz_id: Uuid,
    ) -> PortResult<Option<Flashcard>> {
        let quiz = self.owned_quiz(requester, quiz_id).await?;
        let answered: Vec<Uuid> = self
            .db
            .list_scores(quiz.id)
            .await?
            .into_iter()
            .map(|s| s.flashcard_id)
            .collect();
        let Some(next_id) = quiz
            .flashcard_ids
            .iter()
            .copied()
            .find(|id| !answered.contains(id))
        else {
            return Ok(None);
        };
        let cards = self.db.list_flashcards_for_note(quiz.note_id).await?;
        Ok(cards.into_iter().find(|c| c.id == next_id))
    }

    /// Grades the answer through the AI port and records the score.
    pub async fn submit_answer(
        &self,
        requester: Uuid,
        quiz_id: Uuid,
        flashcard_id: Uuid,
        answer: Option<&str>,
    ) -> PortResult<AnswerOutcome> {
        let answer = required(answer, messages::ANSWER_REQUIRED)?;
        let quiz = self.owned_quiz(requester, quiz_id).await?;
        if !quiz.contains(flashcard_id) {
            return Err(PortError::Validation(messages::FLASHCARD_NOT_IN_QUIZ.to_string()));
        }
        let scores = self.db.list_scores(quiz.id).await?;
        if scores.iter().any(|s| s.flashcard_id == flashcard_id) {
            return Err(PortError::Conflict(
                messages::FLASHCARD_ALREADY_ANSWERED.to_string(),
            ));
        }

        let note = self.db.get_note(quiz.note_id).await?;
        let card = self
            .db
            .list_flashcards_for_note(quiz.note_id)
            .await?
            .into_iter()
            .find(|c| c.id == flashcard_id)
            .ok_or_else(|| PortError::Validation(messages::FLASHCARD_NOT_IN_QUIZ.to_string()))?;
        let language = note.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);

        let judgment = self
            .grader
            .check_answer(&card.question, &card.answer, answer, language)
            .await
            .map_err(upstream)?;

        let (score, quiz) = self
            .db
            .record_score(NewScore {
                quiz_id: quiz.id,
                flashcard_id,
                given_answer: answer.to_string(),
                judgment,
            })
            .await?;
        let scores = self.db.list_scores(quiz.id).await?;
        let progress = QuizProgress::from_scores(&quiz, &scores);
        info!(
            quiz_id = %quiz.id,
            %flashcard_id,
            correct = score.correct,
            state = quiz.state.as_str(),
            "Recorded answer"
        );
        Ok(AnswerOutcome {
            score,
            quiz,
            progress,
        })
    }

    async fn owned_quiz(&self, requester: Uuid, quiz_id: Uuid) -> PortResult<Quiz> {
        let quiz = self.db.get_quiz(quiz_id).await?;
        if quiz.user_id != requester {
            return Err(PortError::Forbidden(messages::UNAUTHORIZED_ACCESS.to_string()));
        }
        Ok(quiz)
    }
}
