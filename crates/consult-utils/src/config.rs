//! Application configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Process-wide settings that are not tied to an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name, shown in page titles and logs
    pub app_name: String,
    /// Address the web UI binds to
    pub bind_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "AI Business Consultant".to_string(),
            bind_address: DEFAULT_BIND.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `CONSULT_APP_NAME` and `CONSULT_BIND`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            app_name: crate::env_var_or("CONSULT_APP_NAME", &defaults.app_name),
            bind_address: crate::env_var_or("CONSULT_BIND", &defaults.bind_address),
        };
        debug!(app_name = %config.app_name, bind = %config.bind_address, "Loaded application config");
        config
    }

    /// Set the bind address
    pub fn with_bind_address(mut self, bind: impl Into<String>) -> Self {
        self.bind_address = bind.into();
        self
    }
}
