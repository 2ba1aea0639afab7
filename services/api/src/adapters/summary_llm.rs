//! services/api/src/adapters/summary_llm.rs
//!
//! This module contains the adapter for the summarizing LLM.
//! It implements the `SummaryService` port from the `core` crate.

use crate::adapters::completion::{complete, parse_json};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use serde::Deserialize;
use study_notes_core::{
    domain::Summary,
    ports::{PortError, PortResult, SummaryService},
};

const SYSTEM_INSTRUCTIONS: &str = r#"You are a study assistant that condenses a student's notes.

Write a clear, faithful summary of the notes you receive:
- Keep every key fact, definition and relationship; drop filler.
- Write in the same language as the notes.
- Use short paragraphs or sentences, no markdown headings.

Respond with ONLY a JSON object of the form:
{"summary": "<the summary>", "language": "<ISO 639-1 code of the notes' language>"}"#;

#[derive(Deserialize)]
struct SummaryReply {
    summary: String,
    language: Option<String>,
}

/// An adapter that implements `SummaryService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiSummaryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSummaryAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl SummaryService for OpenAiSummaryAdapter {
    async fn summarize(&self, content: &str) -> PortResult<Summary> {
        let raw = complete(
            &self.client,
            &self.model,
            SYSTEM_INSTRUCTIONS,
            format!("NOTES:\n---\n{content}\n---"),
        )
        .await?;
        into_summary(parse_json(&raw)?)
    }
}

fn into_summary(reply: SummaryReply) -> PortResult<Summary> {
    let text = reply.summary.trim();
    if text.is_empty() {
        return Err(PortError::Unavailable(
            "Summary LLM returned an empty summary.".to_string(),
        ));
    }
    let language = reply
        .language
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "en".to_string());
    Ok(Summary {
        text: text.to_string(),
        language,
    })
}
