//! crates/study_notes_core/src/services/note.rs

use crate::domain::Note;
use crate::messages;
use crate::ports::{DatabaseService, PortResult};
use crate::services::{ensure_note_owner, non_blank, required};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// CRUD over notes with per-owner access control.
#[derive(Clone)]
pub struct NoteService {
    db: Arc<dyn DatabaseService>,
}

impl NoteService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        owner: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> PortResult<Note> {
        let title = required(title, messages::TITLE_CONTENT_REQUIRED)?;
        let content = required(content, messages::TITLE_CONTENT_REQUIRED)?;
        let note = self.db.create_note(owner, title, content).await?;
        info!(note_id = %note.id, %owner, "Created note");
        Ok(note)
    }

    pub async fn list(&self, owner: Uuid) -> PortResult<Vec<Note>> {
        self.db.list_notes_by_owner(owner).await
    }

    /// Loads a note and checks that `requester` owns it.
    pub async fn get(&self, requester: Uuid, note_id: Uuid) -> PortResult<Note> {
        let note = self.db.get_note(note_id).await?;
        ensure_note_owner(&note, requester)?;
        Ok(note)
    }

    /// Partial update; blank fields leave the stored value alone.
    pub async fn update(
        &self,
        requester: Uuid,
        note_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> PortResult<Note> {
        let note = self.get(requester, note_id).await?;
        let (title, content) = (non_blank(title), non_blank(content));
        if title.is_none() && content.is_none() {
            return Ok(note);
        }
        self.db.update_note(note_id, title, content).await
    }

    pub async fn delete(&self, requester: Uuid, note_id: Uuid) -> PortResult<()> {
        self.get(requester, note_id).await?;
        self.db.delete_note(note_id).await?;
        info!(%note_id, "Deleted note");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use crate::testing::InMemoryDatabase;

    fn service() -> NoteService {
        NoteService::new(Arc::new(InMemoryDatabase::new()))
    }

    #[tokio::test]
    async fn create_requires_title_and_content() {
        let notes = service();
        let owner = Uuid::new_v4();
        for (title, content) in [(None, Some("c")), (Some("t"), None), (Some("  "), Some("c")), (Some("t"), Some(""))] {
            let err = notes.create(owner, title, content).await.unwrap_err();
            assert!(matches!(err, PortError::Validation(ref m) if m == messages::TITLE_CONTENT_REQUIRED));
        }
    }

    #[tokio::test]
    async fn list_returns_only_own_notes() {
        let notes = service();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        notes.create(alice, Some("a1"), Some("x")).await.unwrap();
        notes.create(alice, Some("a2"), Some("x")).await.unwrap();
        notes.create(bob, Some("b1"), Some("x")).await.unwrap();

        let titles: Vec<String> = notes.list(alice).await.unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a2", "a1"]);
    }

    #[tokio::test]
    async fn foreign_notes_are_forbidden_for_every_operation() {
        let notes = service();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let note = notes.create(alice, Some("Secret"), Some("diary")).await.unwrap();

        assert!(matches!(notes.get(bob, note.id).await, Err(PortError::Forbidden(_))));
        assert!(matches!(
            notes.update(bob, note.id, Some("Mine now"), None).await,
            Err(PortError::Forbidden(_))
        ));
        assert!(matches!(notes.delete(bob, note.id).await, Err(PortError::Forbidden(_))));

        let untouched = notes.get(alice, note.id).await.unwrap();
        assert_eq!(untouched.title, "Secret");
    }

    #[tokio::test]
    async fn update_is_partial() {
        let notes = service();
        let owner = Uuid::new_v4();
        let note = notes.create(owner, Some("Title"), Some("Body")).await.unwrap();

        let updated = notes.update(owner, note.id, None, Some("New body")).await.unwrap();
        assert_eq!(updated.title, "Title");
        assert_eq!(updated.content, "New body");
        assert!(updated.updated_at >= note.updated_at);
    }

    #[tokio::test]
    async fn missing_note_is_not_found() {
        let notes = service();
        let err = notes.get(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
