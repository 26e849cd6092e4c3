use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

/// Everything that can go wrong between building a request and reading the reply
#[derive(Error, Debug)]
pub enum LLMError {
    /// Non-success status without a more specific mapping, or an unreachable host
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// HTTP 400 with the provider's explanation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The body decoded but did not contain a usable answer
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Missing key or unknown provider; nothing was sent
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String, model: &str) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 | 403 => Self::AuthenticationFailed,
            404 => Self::ModelNotFound(model.to_string()),
            429 => Self::RateLimitExceeded(body),
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            LLMError::from_status(StatusCode::UNAUTHORIZED, String::new(), "m"),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::FORBIDDEN, String::new(), "m"),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into(), "m"),
            LLMError::RateLimitExceeded(body) if body == "slow down"
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::NOT_FOUND, String::new(), "gpt-x"),
            LLMError::ModelNotFound(model) if model == "gpt-x"
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::BAD_GATEWAY, "upstream".into(), "m"),
            LLMError::RequestFailed(msg) if msg.contains("502")
        ));
    }

    #[test]
    fn test_is_configuration() {
        assert!(LLMError::ConfigurationError("no key".into()).is_configuration());
        assert!(!LLMError::AuthenticationFailed.is_configuration());
    }
}
