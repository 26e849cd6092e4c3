//! Error types for business analysis

use thiserror::Error;

/// Rejected input value
///
/// Every variant carries the human-readable field label so the message can
/// be shown next to the form as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A required field was not supplied
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// A field could not be parsed as a number
    #[error("{field} must be a number, got '{value}'")]
    Invalid { field: &'static str, value: String },

    /// A field is outside its allowed range
    #[error("{field} {constraint}")]
    OutOfRange {
        field: &'static str,
        constraint: &'static str,
    },
}

/// A metric that cannot be computed for the given inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricError {
    /// The formula's denominator is zero
    #[error("{metric} is undefined: division by zero")]
    DivisionByZero { metric: &'static str },

    /// The formula has no meaningful value for these inputs
    #[error("{metric} is undefined: {reason}")]
    Undefined {
        metric: &'static str,
        reason: &'static str,
    },

    /// The result overflowed to infinity or NaN
    #[error("{metric} is not a finite number")]
    NonFinite { metric: &'static str },
}

impl MetricError {
    /// Name of the metric that failed
    pub fn metric(&self) -> &'static str {
        match self {
            Self::DivisionByZero { metric }
            | Self::Undefined { metric, .. }
            | Self::NonFinite { metric } => metric,
        }
    }
}

/// Errors raised while producing a report
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input validation failed
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// The LLM provider failed
    #[error("LLM error: {0}")]
    Llm(#[from] consult_llm::LLMError),

    /// A prompt could not be rendered
    #[error("Prompt error: {0}")]
    Prompt(#[from] consult_prompt::PromptError),

    /// The provider answered without any text
    #[error("The {stage} report came back empty")]
    EmptyResponse { stage: &'static str },

    /// Metrics could not be serialized for the prompt
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Whether the error was caused by the caller's input
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Whether the error stems from missing or bad provider configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Llm(e) if e.is_configuration())
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Result of a single formula
pub type MetricResult = std::result::Result<f64, MetricError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = InputError::Missing { field: "Revenue" };
        assert_eq!(err.to_string(), "Revenue is required");

        let err = InputError::Invalid {
            field: "Inventory",
            value: "lots".to_string(),
        };
        assert_eq!(err.to_string(), "Inventory must be a number, got 'lots'");

        let err = InputError::OutOfRange {
            field: "Gross Margin % (0-1)",
            constraint: "must be between 0 and 1",
        };
        assert_eq!(err.to_string(), "Gross Margin % (0-1) must be between 0 and 1");
    }

    #[test]
    fn test_metric_error_name() {
        let err = MetricError::DivisionByZero { metric: "Current" };
        assert_eq!(err.metric(), "Current");
        assert_eq!(err.to_string(), "Current is undefined: division by zero");
    }

    #[test]
    fn test_error_classification() {
        let err: AnalysisError = InputError::Missing { field: "EBIT" }.into();
        assert!(err.is_input());
        assert!(!err.is_configuration());

        let err: AnalysisError =
            consult_llm::LLMError::ConfigurationError("missing key".to_string()).into();
        assert!(err.is_configuration());
    }
}
