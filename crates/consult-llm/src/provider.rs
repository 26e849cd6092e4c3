use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A backend that turns a prompt into text
///
/// Implementations map their HTTP failures onto [`crate::LLMError`] so callers
/// can tell a bad key from an outage without knowing which backend is in use.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short identifier used in logs and reports, e.g. `gemini`
    fn name(&self) -> &str;
}
