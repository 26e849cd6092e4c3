//! Prompt template management for consult-rs
//!
//! Prompts are Jinja2 templates rendered with MiniJinja. A [`PromptRegistry`]
//! holds them by name so analysis code asks for `"consult.cfo"` rather than
//! carrying template strings around.
//!
//! # Quick Start
//!
//! ```
//! use consult_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new("greeting", "Hello, {{ name }}!").unwrap());
//!
//! let prompt = registry.render("greeting", &json!({ "name": "CFO" })).unwrap();
//! assert_eq!(prompt, "Hello, CFO!");
//! ```

mod error;
mod jinja;
mod registry;
mod template;

// Re-export core types
pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
