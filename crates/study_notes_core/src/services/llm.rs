//! crates/study_notes_core/src/services/llm.rs
//!
//! Orchestrates the AI-backed operations: one outbound call each, with the
//! structured result persisted where there is something to persist.

use crate::domain::{AnswerJudgment, Flashcard, Summary};
use crate::messages;
use crate::ports::{
    AnswerCheckingService, DatabaseService, FlashcardGenerationService, PortError, PortResult,
    SummaryService,
};
use crate::services::{ensure_note_owner, required, FlashcardService};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub(crate) const DEFAULT_LANGUAGE: &str = "en";

#[derive(Clone)]
pub struct LlmService {
    db: Arc<dyn DatabaseService>,
    flashcards: FlashcardService,
    summarizer: Arc<dyn SummaryService>,
    generator: Arc<dyn FlashcardGenerationService>,
    grader: Arc<dyn AnswerCheckingService>,
}

impl LlmService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        flashcards: FlashcardService,
        summarizer: Arc<dyn SummaryService>,
        generator: Arc<dyn FlashcardGenerationService>,
        grader: Arc<dyn AnswerCheckingService>,
    ) -> Self {
        Self {
            db,
            flashcards,
            summarizer,
            generator,
            grader,
        }
    }

    /// Summarizes the note's content and stores the summary on the note.
    pub async fn generate_summary(&self, requester: Uuid, note_id: Uuid) -> PortResult<Summary> {
        let note = self.db.get_note(note_id).await?;
        ensure_note_owner(&note, requester)?;
        if note.content.trim().is_empty() {
            return Err(PortError::Validation(messages::EMPTY_NOTE_CONTENT.to_string()));
        }

        let summary = self.summarizer.summarize(&note.content).await.map_err(upstream)?;
        self.db.save_summary(note_id, &summary).await?;
        info!(%note_id, language = %summary.language, "Stored generated summary");
        Ok(summary)
    }

    /// Generates a new flashcard set from the note's summary, replacing the old one.
    pub async fn generate_flashcards(
        &self,
        requester: Uuid,
        note_id: Uuid,
    ) -> PortResult<Vec<Flashcard>> {
        let note = self.db.get_note(note_id).await?;
        ensure_note_owner(&note, requester)?;
        let summary = note
            .summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PortError::Validation(messages::NO_SUMMARY_AVAILABLE.to_string()))?;
        let language = note.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);

        let drafts = self
            .generator
            .generate_flashcards(summary, language)
            .await
            .map_err(upstream)?;
        if drafts.is_empty() {
            warn!(%note_id, "Flashcard generator returned nothing; keeping existing cards");
            return Err(PortError::Unavailable(messages::NO_FLASHCARDS_GENERATED.to_string()));
        }
        self.flashcards.replace_for_note(note_id, &drafts).await
    }

    /// Judges a free-form answer without recording anything.
    pub async fn check_answer(
        &self,
        question: Option<&str>,
        expected: Option<&str>,
        given: Option<&str>,
        language: Option<&str>,
    ) -> PortResult<AnswerJudgment> {
        let question = required(question, messages::ANSWER_FIELDS_REQUIRED)?;
        let expected = required(expected, messages::ANSWER_FIELDS_REQUIRED)?;
        let given = required(given, messages::ANSWER_FIELDS_REQUIRED)?;
        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);

        self.grader
            .check_answer(question, expected, given, language)
            .await
            .map_err(upstream)
    }
}

/// Every failure of an outbound AI call reaches the caller as unavailable.
pub(crate) fn upstream(err: PortError) -> PortError {
    match err {
        PortError::Unavailable(_) => err,
        other => PortError::Unavailable(other.to_string()),
    }
}
