//! Named prompt templates

use crate::{PromptError, PromptTemplate, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Templates by name, shared across request handlers
///
/// Registering a name twice replaces the earlier template.
#[derive(Default)]
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<dyn PromptTemplate>>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: PromptTemplate + 'static>(&self, template: T) {
        let name = template.name().to_string();
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(name, Arc::new(template));
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PromptTemplate>> {
        let templates = self.templates.read().ok()?;
        templates.get(name).map(Arc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Render the template registered as `name`
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        match self.get(name) {
            Some(template) => template.render(vars),
            None => Err(PromptError::NotRegistered(name.to_string())),
        }
    }

    /// Registered names in alphabetical order
    pub fn list(&self) -> Vec<String> {
        let Ok(templates) = self.templates.read() else {
            return Vec::new();
        };
        let mut names: Vec<String> = templates.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.read().map_or(0, |t| t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.list()).finish()
    }
}
