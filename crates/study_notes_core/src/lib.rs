pub mod domain;
pub mod messages;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use domain::{
    AnswerJudgment, AuthSession, Flashcard, FlashcardDraft, NewScore, NewUser, Note, Quiz,
    QuizProgress, QuizState, Score, Summary, User, UserCredentials,
};
pub use ports::{
    AnswerCheckingService, CredentialHasher, DatabaseService, FlashcardGenerationService,
    PortError, PortResult, ResetNotifier, SummaryService,
};
pub use services::{
    AnswerOutcome, FlashcardService, LlmService, NoteService, QuizService, UserService,
    UserSettings,
};
