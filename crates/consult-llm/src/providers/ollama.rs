//! Local models through Ollama's `/api/chat`
//!
//! Streaming is turned off so a report arrives as one JSON object. No key is
//! needed, but the model has to be pulled beforehand (`ollama pull mistral`).

use super::http;
use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub(crate) const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

pub struct OllamaProvider {
    client: Client,
    host: String,
}

impl OllamaProvider {
    /// `host` is the server root, e.g. `http://localhost:11434`
    pub fn new(host: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout_secs)?,
            host: http::trim_base(host),
        })
    }

    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_OLLAMA_HOST, http::DEFAULT_TIMEOUT_SECS)
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    #[instrument(skip(self, request), fields(provider = "ollama", model = %request.model, host = %self.host))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest {
            messages: http::inline_system(request.system, request.messages)
                .map(|m| ChatTurn {
                    role: m.role.as_str().to_string(),
                    content: m.content,
                })
                .collect(),
            model: request.model,
            stream: false,
            options: Options {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                stop: request.stop_sequences,
            },
        };
        debug!("Posting chat to Ollama");

        let post = self.client.post(format!("{}/api/chat", self.host)).json(&body);
        let reply: ChatResponse = match http::send_json(post, &body.model).await {
            Ok(reply) => reply,
            Err(LLMError::HttpError(e)) if e.is_connect() => {
                return Err(LLMError::RequestFailed(format!(
                    "Could not reach Ollama at {}; is it running? ({e})",
                    self.host
                )));
            }
            Err(e) => return Err(e),
        };

        let usage = TokenUsage {
            input_tokens: reply.prompt_eval_count,
            output_tokens: reply.eval_count,
        };
        let stop_reason = if reply.done_reason.as_deref() == Some("length") {
            StopReason::MaxTokens
        } else {
            StopReason::EndTurn
        };
        debug!(?stop_reason, usage.input_tokens, usage.output_tokens, "Chat reply received");

        Ok(CompletionResponse {
            message: Message::assistant(reply.message.content),
            stop_reason,
            usage,
        })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatTurn>,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatTurn {
    role: String,
    content: String,
}

/// Ollama's name for the token budget is `num_predict`
#[derive(Debug, Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    num_predict: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatTurn,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}
