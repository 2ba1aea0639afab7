//! services/api/src/adapters/completion.rs
//!
//! Shared plumbing for the chat-completion adapters: one system prompt, one user
//! message, one choice back, and a JSON body pulled out of the reply.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde::de::DeserializeOwned;
use study_notes_core::ports::{PortError, PortResult};
use tracing::debug;

/// Sends a single system + user exchange and returns the text of the first choice.
pub async fn complete(
    client: &Client<OpenAIConfig>,
    model: &str,
    system: &str,
    user: String,
) -> PortResult<String> {
    let messages = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
    ];

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .n(1)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PortError::Unavailable("LLM returned no choices in its response.".to_string()))?
        .message
        .content
        .ok_or_else(|| PortError::Unavailable("LLM response contained no text content.".to_string()))?;

    debug!(model, chars = content.len(), "Received completion");
    Ok(content)
}

/// Parses a JSON reply, tolerating a surrounding markdown code fence.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> PortResult<T> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        PortError::Unavailable(format!("LLM reply was not the expected JSON: {e}"))
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
