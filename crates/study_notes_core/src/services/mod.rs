//! crates/study_notes_core/src/services/mod.rs
//!
//! Domain services. Each one validates caller input, enforces ownership and
//! orchestrates a single persistence operation plus at most one external call.

pub mod flashcard;
pub mod llm;
pub mod note;
pub mod quiz;
pub mod user;

pub use flashcard::FlashcardService;
pub use llm::LlmService;
pub use note::NoteService;
pub use quiz::{AnswerOutcome, QuizService};
pub use user::{UserService, UserSettings};

use crate::domain::Note;
use crate::messages::UNAUTHORIZED_ACCESS;
use crate::ports::{PortError, PortResult};
use uuid::Uuid;

/// Returns the trimmed value, or a validation error naming the missing field.
pub(crate) fn required<'a>(value: Option<&'a str>, message: &str) -> PortResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PortError::Validation(message.to_string())),
    }
}

/// Treats blank optional input as "leave unchanged".
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn ensure_note_owner(note: &Note, requester: Uuid) -> PortResult<()> {
    if note.owner_id != requester {
        tracing::warn!(note_id = %note.id, %requester, "Rejected access to a foreign note");
        return Err(PortError::Forbidden(UNAUTHORIZED_ACCESS.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required(Some("  hi "), "x").unwrap(), "hi");
        assert!(matches!(required(Some("   "), "x"), Err(PortError::Validation(_))));
        assert!(matches!(required(None, "x"), Err(PortError::Validation(_))));
    }

    #[test]
    fn non_blank_drops_whitespace_only_values() {
        assert_eq!(non_blank(Some(" a ")), Some("a"));
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
    }
}
