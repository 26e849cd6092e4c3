//! The prompt template abstraction

use crate::Result;

/// A named prompt that renders to text
///
/// Variables travel as `serde_json::Value` so that a registry can hold
/// templates as trait objects.
pub trait PromptTemplate: Send + Sync {
    fn name(&self) -> &str;

    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Source text before rendering
    fn raw_template(&self) -> &str;

    /// Render from any serializable context, e.g. a metrics struct
    fn render_serialize<T: serde::Serialize>(&self, vars: &T) -> Result<String>
    where
        Self: Sized,
    {
        match serde_json::to_value(vars) {
            Ok(value) => self.render(&value),
            Err(e) => Err(crate::PromptError::Context(e.to_string())),
        }
    }
}
