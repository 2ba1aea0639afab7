//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use chrono::Duration;
use std::sync::Arc;
use study_notes_core::ports::{
    AnswerCheckingService, CredentialHasher, DatabaseService, FlashcardGenerationService,
    ResetNotifier, SummaryService,
};
use study_notes_core::services::{
    FlashcardService, LlmService, NoteService, QuizService, UserService, UserSettings,
};

/// The outbound adapters the services are built from.
pub struct Adapters {
    pub db: Arc<dyn DatabaseService>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub notifier: Arc<dyn ResetNotifier>,
    pub summarizer: Arc<dyn SummaryService>,
    pub flashcard_generator: Arc<dyn FlashcardGenerationService>,
    pub grader: Arc<dyn AnswerCheckingService>,
}

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: UserService,
    pub notes: NoteService,
    pub flashcards: FlashcardService,
    pub llm: LlmService,
    pub quizzes: QuizService,
}

impl AppState {
    pub fn new(config: Arc<Config>, adapters: Adapters) -> Self {
        let settings = UserSettings {
            session_ttl: Duration::days(config.session_ttl_days),
            reset_token_ttl: Duration::minutes(config.reset_token_ttl_minutes),
            reset_url: config.password_reset_url.clone(),
        };
        let flashcards = FlashcardService::new(adapters.db.clone());

        Self {
            users: UserService::new(
                adapters.db.clone(),
                adapters.hasher,
                adapters.notifier,
                settings,
            ),
            notes: NoteService::new(adapters.db.clone()),
            llm: LlmService::new(
                adapters.db.clone(),
                flashcards.clone(),
                adapters.summarizer,
                adapters.flashcard_generator,
                adapters.grader.clone(),
            ),
            quizzes: QuizService::new(adapters.db, adapters.grader),
            flashcards,
            config,
        }
    }
}
