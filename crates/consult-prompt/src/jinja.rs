//! Jinja2 prompts compiled by MiniJinja

use crate::{PromptError, PromptTemplate, Result};
use minijinja::{Environment, UndefinedBehavior};

/// Jinja2 prompt rendered with MiniJinja
///
/// The source is syntax-checked on construction. Rendering uses strict
/// undefined behaviour: a variable missing from the context is an error, not
/// an empty string. Output is never HTML-escaped.
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// ```
    /// use consult_prompt::{JinjaTemplate, PromptTemplate};
    /// use serde_json::json;
    ///
    /// let cfo = JinjaTemplate::new("cfo", "Review: {{ data }}").unwrap();
    /// assert_eq!(cfo.render(&json!({ "data": 1.5 })).unwrap(), "Review: 1.5");
    /// ```
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        if let Err(e) = Self::environment().template_from_str(&source) {
            return Err(PromptError::InvalidTemplate {
                name,
                detail: e.to_string(),
            });
        }

        Ok(Self { name, source })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        // Templates are compiled per render, nothing is cached
        Self::environment()
            .render_str(&self.source, minijinja::Value::from_serialize(vars))
            .map_err(|e| PromptError::Render {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }

    fn raw_template(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .field("len", &self.source.len())
            .finish()
    }
}
