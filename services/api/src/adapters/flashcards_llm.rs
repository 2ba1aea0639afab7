//! services/api/src/adapters/flashcards_llm.rs
//!
//! This module contains the adapter for the flashcard-writing LLM.
//! It implements the `FlashcardGenerationService` port from the `core` crate.

use crate::adapters::completion::{complete, parse_json};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use serde::Deserialize;
use study_notes_core::{
    domain::FlashcardDraft,
    ports::{FlashcardGenerationService, PortResult},
};
use tracing::warn;

const SYSTEM_INSTRUCTIONS: &str = r#"You write flashcards that help a student memorize a summary.

Rules:
- Each card has one short question and one concise answer taken from the summary.
- Cover the important facts; do not invent anything the summary does not say.
- Between 3 and 10 cards.
- Questions and answers must be in the language given to you.

Respond with ONLY a JSON object of the form:
{"flashcards": [{"question": "...", "answer": "..."}]}"#;

#[derive(Deserialize)]
struct FlashcardsReply {
    #[serde(default)]
    flashcards: Vec<CardReply>,
}

#[derive(Deserialize)]
struct CardReply {
    question: String,
    answer: String,
}

/// An adapter that implements `FlashcardGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFlashcardAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiFlashcardAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl FlashcardGenerationService for OpenAiFlashcardAdapter {
    async fn generate_flashcards(
        &self,
        summary: &str,
        language: &str,
    ) -> PortResult<Vec<FlashcardDraft>> {
        let raw = complete(
            &self.client,
            &self.model,
            SYSTEM_INSTRUCTIONS,
            format!("LANGUAGE: {language}\n\nSUMMARY:\n---\n{summary}\n---"),
        )
        .await?;
        Ok(into_drafts(parse_json(&raw)?))
    }
}

/// Drops cards with a blank side; an empty result is left for the caller to judge.
fn into_drafts(reply: FlashcardsReply) -> Vec<FlashcardDraft> {
    let total = reply.flashcards.len();
    let drafts: Vec<FlashcardDraft> = reply
        .flashcards
        .into_iter()
        .filter_map(|card| {
            let question = card.question.trim();
            let answer = card.answer.trim();
            (!question.is_empty() && !answer.is_empty()).then(|| FlashcardDraft {
                question: question.to_string(),
                answer: answer.to_string(),
            })
        })
        .collect();
    if drafts.len() < total {
        warn!(dropped = total - drafts.len(), "Discarded incomplete flashcards");
    }
    drafts
}
