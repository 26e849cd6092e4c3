//! Provider backends
//!
//! OpenAI and DeepSeek share one implementation; Gemini and Ollama have their
//! own wire formats.

pub mod gemini;
pub(crate) mod http;
pub mod ollama;
pub mod openai;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use ollama::OllamaProvider;
pub use openai::{OpenAIConfig, OpenAIProvider};
