//! LLM gateway for consult-rs
//!
//! This crate provides provider-agnostic abstractions for sending a prompt to
//! a Large Language Model and reading back its text. It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - Concrete providers for Gemini, OpenAI (and DeepSeek through the
//!   OpenAI-compatible API) and a local Ollama server
//! - Provider selection from environment or per-session settings

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod settings;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;
pub use settings::{ProviderKind, ProviderSettings, build_provider};
