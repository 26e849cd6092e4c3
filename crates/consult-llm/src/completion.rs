//! Completion request and response types
//!
//! A consultant report is one request: the rendered prompt as a single user
//! message, optionally preceded by a system instruction.

use crate::settings::DEFAULT_MAX_TOKENS;
use crate::{Message, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Provider-specific model name
    pub model: String,
    pub messages: Vec<Message>,
    /// System instruction, sent the way each provider expects it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Generation budget; Gemini 2.5 models spend part of it thinking
    pub max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl CompletionRequest {
    /// Empty request for `model` with the default token budget
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            stop_sequences: None,
        }
    }

    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder(Self::new(model))
    }

    /// The first user message, which carries the rendered prompt
    pub fn prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequestBuilder(CompletionRequest);

impl CompletionRequestBuilder {
    pub fn add_message(mut self, message: Message) -> Self {
        self.0.messages.push(message);
        self
    }

    /// Shorthand for adding a user message
    pub fn prompt(self, text: impl Into<String>) -> Self {
        self.add_message(Message::user(text))
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.0.system = Some(system.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.0.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.0.temperature = Some(temperature);
        self
    }

    pub fn stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.0.stop_sequences.get_or_insert_with(Vec::new).push(stop.into());
        self
    }

    pub fn build(self) -> CompletionRequest {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub message: Message,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Generated text, `None` when blank
    pub fn text(&self) -> Option<&str> {
        self.message.text()
    }
}

/// Why generation ended, normalized across providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    /// The token budget ran out; the report is cut short
    MaxTokens,
    StopSequence,
    /// Output withheld by the provider's safety filter
    ContentFilter,
}

impl StopReason {
    /// Whether the text ends before the model finished its answer
    pub fn is_truncated(self) -> bool {
        matches!(self, Self::MaxTokens | Self::ContentFilter)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}
