//! crates/study_notes_core/src/messages.rs
//!
//! Client-facing error messages shared by the services and the adapters, so the
//! same failure reads the same no matter which layer detects it.

pub const USER_NOT_FOUND: &str = "User not found.";
pub const USER_ALREADY_EXISTS: &str = "User already exists.";
pub const EMAIL_ALREADY_EXISTS: &str = "Email already exists.";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";
pub const UNAUTHORIZED_ACCESS: &str = "Unauthorized access.";
pub const SESSION_INVALID: &str = "Session is missing, expired or invalid.";
pub const USERNAME_EMAIL_PASSWORD_REQUIRED: &str = "Username, email, and password are required.";
pub const USERNAME_PASSWORD_REQUIRED: &str = "Username and password are required.";
pub const INVALID_EMAIL: &str = "Invalid email address.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters long.";
pub const CURRENT_NEW_PASSWORD_REQUIRED: &str = "Current password and new password are required.";
pub const PASSWORD_INCORRECT: &str = "Current password is incorrect.";
pub const PASSWORD_MISMATCH: &str = "New password and confirm password do not match.";
pub const EMAIL_REQUIRED: &str = "Email is required.";
pub const TOKEN_PASSWORD_FIELDS_REQUIRED: &str = "Token and both password fields are required.";
pub const EXPIRED_INVALID_TOKEN: &str = "The provided token is either expired or invalid.";

pub const NOTE_NOT_FOUND: &str = "Note not found.";
pub const TITLE_CONTENT_REQUIRED: &str = "Title and content are required for creating a note.";
pub const EMPTY_NOTE_CONTENT: &str = "Note content cannot be empty.";
pub const NO_SUMMARY_AVAILABLE: &str = "No summary available for this note.";

pub const ANSWER_FIELDS_REQUIRED: &str = "Missing question, correct_answer or user_answer.";
pub const ANSWER_REQUIRED: &str = "Answer is required.";
pub const NO_FLASHCARDS_FOR_NOTE: &str = "No flashcards found for this note.";
pub const NO_FLASHCARDS_GENERATED: &str = "The AI service returned no flashcards.";
pub const FLASHCARD_NOT_IN_QUIZ: &str = "Flashcard does not belong to this quiz.";
pub const FLASHCARD_ALREADY_ANSWERED: &str = "Flashcard has already been answered in this quiz.";
pub const QUIZ_NOT_FOUND: &str = "Quiz session not found.";
pub const NO_QUIZ_FOR_NOTE: &str = "No quiz has been started for this note.";
