pub mod completion;
pub mod db;
pub mod flashcards_llm;
pub mod grading_llm;
pub mod notifier;
pub mod password;
pub mod summary_llm;

pub use db::DbAdapter;
pub use flashcards_llm::OpenAiFlashcardAdapter;
pub use grading_llm::OpenAiGradingAdapter;
pub use notifier::LogResetNotifier;
pub use password::Argon2Hasher;
pub use summary_llm::OpenAiSummaryAdapter;
