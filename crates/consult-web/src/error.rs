use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use consult_analysis::AnalysisError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    /// Submitted figures failed validation
    #[error("{0}")]
    Validation(String),

    /// Provider settings are incomplete, e.g. a missing API key
    #[error("{0}")]
    Configuration(String),

    /// The LLM provider failed or answered with nothing
    #[error("Analysis failed: {0}")]
    Provider(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// A page template failed to render
    #[error("Failed to render page: {0}")]
    Render(#[from] minijinja::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebError::Configuration(_) | WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Provider(_) => StatusCode::BAD_GATEWAY,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Render(_) | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            WebError::Render(_) | WebError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AnalysisError> for WebError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Input(e) => WebError::Validation(e.to_string()),
            AnalysisError::Llm(e) if e.is_configuration() => WebError::Configuration(e.to_string()),
            AnalysisError::Llm(e) => WebError::Provider(e.to_string()),
            e @ AnalysisError::EmptyResponse { .. } => WebError::Provider(e.to_string()),
            e @ (AnalysisError::Prompt(_) | AnalysisError::Serialization(_)) => {
                WebError::Internal(e.to_string())
            }
        }
    }
}

/// Malformed or incomplete JSON bodies get the same `{"error": ...}` shape as
/// every other API failure
impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        WebError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match &self {
            WebError::Render(_) | WebError::Internal(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            WebError::Provider(_) => {
                tracing::warn!("Provider error: {}", self);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), Json(json!({ "error": self.user_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consult_analysis::InputError;
    use consult_llm::LLMError;

    #[test]
    fn test_analysis_error_mapping() {
        let err: WebError = AnalysisError::Input(InputError::Missing { field: "Revenue" }).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.user_message(), "Revenue is required");

        let err: WebError =
            AnalysisError::Llm(LLMError::ConfigurationError("openai requires an API key".into()))
                .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.user_message().contains("requires an API key"));

        let err: WebError = AnalysisError::Llm(LLMError::RateLimitExceeded("quota".into())).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.user_message().starts_with("Analysis failed: "));

        let err: WebError = AnalysisError::EmptyResponse { stage: "CEO" }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = WebError::Internal("lock poisoned".into());
        assert_eq!(err.user_message(), "Internal server error");
    }
}
