use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

/// A chat message for the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Incremental reply text. Each item is a delta, not the accumulated message.
///
/// The stream is finite and cannot be restarted; dropping it cancels the request.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Chat backends implement this.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a chat request and return the whole assistant reply.
    async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError>;

    /// Send a chat request and stream the reply as deltas.
    async fn stream(&self, messages: Vec<Message>) -> Result<TokenStream, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("model reported an error: {0}")]
    ModelError(String),
}

/// Builds the full assistant message from streamed deltas. Owned by the caller,
/// one per reply.
#[derive(Debug, Default, Clone)]
pub struct MessageAccumulator {
    text: String,
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and return the message so far.
    pub fn push(&mut self, delta: &str) -> &str {
        self.text.push_str(delta);
        &self.text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_message(self) -> Message {
        Message::assistant(self.text)
    }
}

/// Message list for a new turn: the system prompt, each prior (user, assistant)
/// exchange in order, then the new user message.
pub fn format_history(message: &str, history: &[(String, String)], system_prompt: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(Message::system(system_prompt));
    for (query, response) in history {
        messages.push(Message::user(query.as_str()));
        messages.push(Message::assistant(response.as_str()));
    }
    messages.push(Message::user(message));
    messages
}
