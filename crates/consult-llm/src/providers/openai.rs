//! OpenAI chat completions
//!
//! DeepSeek serves the same wire format, so [`OpenAIConfig::deepseek`] reuses
//! this provider with its own base URL and name.

use super::http;
use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub(crate) const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL up to, not including, `/chat/completions`
    pub api_base: String,
    pub timeout_secs: u64,
    /// Reported by [`LLMProvider::name`]
    pub provider_name: String,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: http::DEFAULT_TIMEOUT_SECS,
            provider_name: "openai".to_string(),
        }
    }

    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_DEEPSEEK_API_BASE.to_string(),
            provider_name: "deepseek".to_string(),
            ..Self::new(api_key)
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = http::trim_base(api_base);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("provider_name", &self.provider_name)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            config,
        })
    }

    /// OpenAI with default base URL and timeout
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(provider = %self.config.provider_name, model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest {
            messages: build_openai_messages(request.system, request.messages),
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences,
        };
        let url = format!("{}/chat/completions", self.config.api_base);
        debug!(%url, "Posting chat completion");

        let post = self.client.post(url).bearer_auth(&self.config.api_key).json(&body);
        let reply: ChatResponse = http::send_json(post, &body.model).await?;

        // Only one choice is ever requested
        let Some(choice) = reply.choices.into_iter().next() else {
            return Err(LLMError::UnexpectedResponse("No choices in response".to_string()));
        };
        let usage = reply.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });
        let stop_reason = map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"));
        debug!(?stop_reason, usage.input_tokens, usage.output_tokens, "Chat completion received");

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason,
            usage,
        })
    }

    fn name(&self) -> &str {
        &self.config.provider_name
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    /// Null when the output was filtered
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

/// The system instruction travels as the first message
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<ChatMessage> {
    http::inline_system(system, messages)
        .map(|m| ChatMessage {
            role: m.role.as_str(),
            content: m.content,
        })
        .collect()
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        other => {
            debug!(finish_reason = other, "Unrecognised finish reason");
            StopReason::EndTurn
        }
    }
}
