//! Google Gemini through the Generative Language API
//!
//! One `models/{model}:generateContent` call per report. The key travels in
//! the `x-goog-api-key` header rather than the query string so it stays out of
//! request logs.

use super::http;
use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub(crate) const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiConfig {
    /// Google AI Studio key
    pub api_key: String,
    /// Everything before `/models/...`
    pub api_base: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout_secs: http::DEFAULT_TIMEOUT_SECS,
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

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            config,
        })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.config.api_base)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(provider = "gemini", model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = GenerateRequest {
            contents: request.messages.into_iter().map(Content::from).collect(),
            system_instruction: request.system.map(Instruction::from),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                stop_sequences: request.stop_sequences,
            },
        };
        debug!("Posting generateContent");

        let post = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body);
        let reply: GenerateResponse = http::send_json(post, &request.model).await?;

        let usage = reply.usage_metadata.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        });

        // A blocked prompt comes back with no candidates and a feedback reason
        let Some(candidate) = reply.candidates.into_iter().next() else {
            let reason = reply
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "unknown".to_string());
            return Err(LLMError::UnexpectedResponse(format!(
                "No candidates in response (block reason: {reason})"
            )));
        };

        let text: String = candidate
            .content
            .into_iter()
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect();
        let stop_reason = map_finish_reason(candidate.finish_reason.as_deref().unwrap_or("STOP"));
        debug!(?stop_reason, usage.input_tokens, usage.output_tokens, "Candidate received");

        Ok(CompletionResponse {
            message: Message::assistant(text),
            stop_reason,
            usage,
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Instruction>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

/// Gemini calls the assistant `model` and has no system role in `contents`
impl From<Message> for Content {
    fn from(message: Message) -> Self {
        let role = match message.role {
            Role::Assistant => "model",
            Role::User | Role::System => "user",
        };
        Self {
            role,
            parts: vec![Part { text: message.content }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Instruction {
    parts: Vec<Part>,
}

impl From<String> for Instruction {
    fn from(text: String) -> Self {
        Self {
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    /// Absent when the candidate was filtered
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn map_finish_reason(reason: &str) -> StopReason {
    match reason {
        "MAX_TOKENS" => StopReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => StopReason::ContentFilter,
        "STOP" => StopReason::EndTurn,
        other => {
            debug!(finish_reason = other, "Unrecognised finish reason");
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("AIza-test").unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(
            provider.config().api_base,
            "https://generativelanguage.googleapis.com/v1beta"
        );
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Message::user("hi").into(), Message::assistant("hello").into()],
            system_instruction: Some(Instruction::from("be brief".to_string())),
            generation_config: GenerationConfig {
                temperature: None,
                max_output_tokens: 256,
                stop_sequences: None,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
        assert!(value["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason("STOP"), StopReason::EndTurn);
        assert_eq!(map_finish_reason("MAX_TOKENS"), StopReason::MaxTokens);
        assert_eq!(map_finish_reason("SAFETY"), StopReason::ContentFilter);
        assert_eq!(map_finish_reason("OTHER"), StopReason::EndTurn);
    }

    #[tokio::test]
    async fn test_complete_joins_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "AIza-test"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Analyse"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Strong "}, {"text": "liquidity."}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4, "totalTokenCount": 14}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            GeminiProvider::with_config(GeminiConfig::new("AIza-test").with_api_base(server.uri()))
                .unwrap();
        let request = CompletionRequest::builder("gemini-2.5-flash")
            .add_message(Message::user("Analyse"))
            .build();

        let response = provider.complete(request).await.unwrap();
        assert_eq!(response.message.content, "Strong liquidity.");
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let provider =
            GeminiProvider::with_config(GeminiConfig::new("k").with_api_base(server.uri()))
                .unwrap();
        let request = CompletionRequest::builder("gemini-2.5-flash")
            .add_message(Message::user("Analyse"))
            .build();

        let err = provider.complete(request).await.unwrap_err();
        assert!(matches!(err, LLMError::UnexpectedResponse(msg) if msg.contains("SAFETY")));
    }

    #[tokio::test]
    async fn test_bad_key_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let provider =
            GeminiProvider::with_config(GeminiConfig::new("bad").with_api_base(server.uri()))
                .unwrap();
        let request = CompletionRequest::builder("gemini-2.5-flash")
            .add_message(Message::user("Analyse"))
            .build();

        let err = provider.complete(request).await.unwrap_err();
        assert!(matches!(err, LLMError::AuthenticationFailed));
    }
}
