//! services/api/src/adapters/grading_llm.rs
//!
//! This module contains the adapter for the answer-grading LLM.
//! It implements the `AnswerCheckingService` port from the `core` crate.

use crate::adapters::completion::{complete, parse_json};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use serde::Deserialize;
use study_notes_core::{
    domain::AnswerJudgment,
    ports::{AnswerCheckingService, PortResult},
};

const SYSTEM_INSTRUCTIONS: &str = r#"You grade a student's flashcard answer.

Compare the student's answer with the expected answer for the question.
- Judge meaning, not wording: synonyms, paraphrases and minor spelling mistakes are fine.
- An answer that is incomplete in a way that changes its meaning is incorrect.
- Write the feedback in the language you are given, in one or two friendly sentences.
  When the answer is wrong, say what the correct answer is.

Respond with ONLY a JSON object of the form:
{"correct": true, "feedback": "..."}"#;

#[derive(Deserialize)]
struct JudgmentReply {
    correct: bool,
    #[serde(default)]
    feedback: String,
}

/// An adapter that implements `AnswerCheckingService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGradingAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGradingAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl AnswerCheckingService for OpenAiGradingAdapter {
    async fn check_answer(
        &self,
        question: &str,
        expected: &str,
        given: &str,
        language: &str,
    ) -> PortResult<AnswerJudgment> {
        let raw = complete(
            &self.client,
            &self.model,
            SYSTEM_INSTRUCTIONS,
            format!(
                "LANGUAGE: {language}\n\nQUESTION: {question}\n\nEXPECTED ANSWER: {expected}\n\nSTUDENT ANSWER: {given}"
            ),
        )
        .await?;
        let reply: JudgmentReply = parse_json(&raw)?;
        Ok(AnswerJudgment {
            correct: reply.correct,
            feedback: reply.feedback.trim().to_string(),
        })
    }
}
