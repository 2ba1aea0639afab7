//! crates/study_notes_core/src/services/flashcard.rs

use crate::domain::{Flashcard, FlashcardDraft};
use crate::messages;
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::services::ensure_note_owner;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct FlashcardService {
    db: Arc<dyn DatabaseService>,
}

impl FlashcardService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Swaps the note's flashcard set for `drafts`. Callers must have checked ownership.
    pub async fn replace_for_note(
        &self,
        note_id: Uuid,
        drafts: &[FlashcardDraft],
    ) -> PortResult<Vec<Flashcard>> {
        let cards = self.db.replace_flashcards(note_id, drafts).await?;
        info!(%note_id, count = cards.len(), "Stored generated flashcards");
        Ok(cards)
    }

    pub async fn list_for_note(&self, requester: Uuid, note_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let note = self.db.get_note(note_id).await?;
        ensure_note_owner(&note, requester)?;
        self.db.list_flashcards_for_note(note_id).await
    }

    pub async fn list_for_user(&self, requester: Uuid, user_id: Uuid) -> PortResult<Vec<Flashcard>> {
        self.db.get_user_by_id(user_id).await?;
        if requester != user_id {
            return Err(PortError::Forbidden(messages::UNAUTHORIZED_ACCESS.to_string()));
        }
        self.db.list_flashcards_for_owner(user_id).await
    }

    pub async fn delete_for_note(&self, requester: Uuid, note_id: Uuid) -> PortResult<()> {
        let note = self.db.get_note(note_id).await?;
        ensure_note_owner(&note, requester)?;
        self.db.delete_flashcards_for_note(note_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::testing::InMemoryDatabase;

    fn draft(q: &str, a: &str) -> FlashcardDraft {
        FlashcardDraft {
            question: q.to_string(),
            answer: a.to_string(),
        }
    }

    async fn owner(db: &InMemoryDatabase, name: &str) -> Uuid {
        db.create_user(NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            hashed_password: "x".to_string(),
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn replacing_yields_fresh_ids() {
        let db = Arc::new(InMemoryDatabase::new());
        let cards = FlashcardService::new(db.clone());
        let alice = owner(&db, "alice").await;
        let note = db.create_note(alice, "t", "c").await.unwrap();

        let first = cards
            .replace_for_note(note.id, &[draft("q1", "a1"), draft("q2", "a2")])
            .await
            .unwrap();
        let second = cards
            .replace_for_note(note.id, &[draft("q1", "a1"), draft("q2", "a2")])
            .await
            .unwrap();

        assert!(first.iter().all(|f| second.iter().all(|s| s.id != f.id)));
        let stored = cards.list_for_note(alice, note.id).await.unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn listing_is_owner_only() {
        let db = Arc::new(InMemoryDatabase::new());
        let cards = FlashcardService::new(db.clone());
        let alice = owner(&db, "alice").await;
        let bob = owner(&db, "bob").await;
        let note = db.create_note(alice, "t", "c").await.unwrap();
        cards.replace_for_note(note.id, &[draft("q", "a")]).await.unwrap();

        assert!(matches!(cards.list_for_note(bob, note.id).await, Err(PortError::Forbidden(_))));
        assert!(matches!(cards.list_for_user(bob, alice).await, Err(PortError::Forbidden(_))));
        assert!(matches!(cards.delete_for_note(bob, note.id).await, Err(PortError::Forbidden(_))));
        assert_eq!(cards.list_for_user(alice, alice).await.unwrap().len(), 1);

        cards.delete_for_note(alice, note.id).await.unwrap();
        assert!(cards.list_for_note(alice, note.id).await.unwrap().is_empty());
    }
}
