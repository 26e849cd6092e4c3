//! Provider selection
//!
//! [`ProviderSettings`] captures which provider to talk to and with which
//! credential. Settings are read from the environment at startup and can be
//! rebuilt per browser session when the user picks another provider or pastes
//! a key. Nothing here is persisted.

use crate::providers::gemini::DEFAULT_GEMINI_API_BASE;
use crate::providers::ollama::DEFAULT_OLLAMA_HOST;
use crate::providers::http::DEFAULT_TIMEOUT_SECS;
use crate::providers::openai::{DEFAULT_DEEPSEEK_API_BASE, DEFAULT_OPENAI_API_BASE};
use crate::providers::{GeminiConfig, GeminiProvider, OllamaProvider, OpenAIConfig, OpenAIProvider};
use crate::{LLMError, LLMProvider, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default sampling temperature for every provider
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default generation budget; Gemini 2.5 spends part of it on thinking
pub const DEFAULT_MAX_TOKENS: usize = 8192;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (free tier through AI Studio)
    #[default]
    Gemini,
    /// OpenAI chat completions
    OpenAI,
    /// Local Ollama server
    Ollama,
    /// DeepSeek, OpenAI-compatible
    DeepSeek,
}

impl ProviderKind {
    /// All providers, in the order the UI lists them
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Gemini,
        ProviderKind::OpenAI,
        ProviderKind::Ollama,
        ProviderKind::DeepSeek,
    ];

    /// Identifier used in env vars, forms and logs
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Ollama => "ollama",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    /// Model used when no override is configured
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::OpenAI => "gpt-4o",
            ProviderKind::Ollama => "mistral",
            ProviderKind::DeepSeek => "deepseek-chat",
        }
    }

    /// Whether the provider is hosted and needs a credential
    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }

    /// Environment variables consulted for the credential, first match wins
    pub fn api_key_vars(self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            ProviderKind::OpenAI => &["OPENAI_API_KEY"],
            ProviderKind::Ollama => &[],
            ProviderKind::DeepSeek => &["DEEPSEEK_API_KEY"],
        }
    }

    /// Base URL used when no override is configured
    pub fn default_api_base(self) -> &'static str {
        match self {
            ProviderKind::Gemini => DEFAULT_GEMINI_API_BASE,
            ProviderKind::OpenAI => DEFAULT_OPENAI_API_BASE,
            ProviderKind::Ollama => DEFAULT_OLLAMA_HOST,
            ProviderKind::DeepSeek => DEFAULT_DEEPSEEK_API_BASE,
        }
    }

    /// Human label for the key input field
    pub fn key_label(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Google API Key",
            ProviderKind::OpenAI => "OpenAI API Key",
            ProviderKind::Ollama => "No key needed",
            ProviderKind::DeepSeek => "DeepSeek API Key",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAI),
            "ollama" => Ok(ProviderKind::Ollama),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            other => Err(LLMError::ConfigurationError(format!(
                "Unknown LLM provider: {other}"
            ))),
        }
    }
}

/// Everything needed to construct a provider
#[derive(Clone, PartialEq)]
pub struct ProviderSettings {
    /// Which backend to call
    pub kind: ProviderKind,
    /// Credential for hosted providers
    pub api_key: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Base URL override (Ollama host for the local provider)
    pub api_base: Option<String>,
    /// HTTP client timeout
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate per report
    pub max_tokens: usize,
}

impl ProviderSettings {
    /// Settings for `kind` with defaults and no credential
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            model: None,
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Read settings from the process environment
    ///
    /// `LLM_PROVIDER` picks the backend (default gemini); the credential,
    /// `LLM_MODEL`, `LLM_API_BASE` (or `OLLAMA_HOST`) and `LLM_TIMEOUT_SECS`
    /// are read for it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(consult_utils::env_var)
    }

    /// Settings for a specific backend, filled from the environment
    pub fn for_kind_from_env(kind: ProviderKind) -> Result<Self> {
        Self::for_kind_from_lookup(kind, consult_utils::env_var)
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let kind = match lookup("LLM_PROVIDER") {
            Some(value) => value.parse()?,
            None => ProviderKind::default(),
        };
        Self::for_kind_from_lookup(kind, lookup)
    }

    /// Settings for `kind` through an arbitrary variable lookup
    pub fn for_kind_from_lookup(
        kind: ProviderKind,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut settings = Self::new(kind);

        settings.api_key = kind.api_key_vars().iter().find_map(|&var| lookup(var));
        settings.model = lookup("LLM_MODEL");
        settings.api_base = lookup("LLM_API_BASE");
        if kind == ProviderKind::Ollama && settings.api_base.is_none() {
            settings.api_base = lookup("OLLAMA_HOST");
        }
        if let Some(raw) = lookup("LLM_TIMEOUT_SECS") {
            settings.timeout_secs = raw.parse().map_err(|_| {
                LLMError::ConfigurationError(format!("LLM_TIMEOUT_SECS is not a number: {raw}"))
            })?;
        }

        Ok(settings)
    }

    /// Replace the credential; blank keys clear it
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into().trim().to_string();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Set a model override
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set a base URL override
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the HTTP timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Effective model name
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(self.kind.default_model())
    }

    /// Effective base URL
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(self.kind.default_api_base())
    }

    /// Whether a request could be sent with these settings
    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check that a hosted provider has a credential
    pub fn validate(&self) -> Result<()> {
        if self.kind.requires_api_key() && self.api_key.is_none() {
            let vars = self.kind.api_key_vars().join(" or ");
            return Err(LLMError::ConfigurationError(format!(
                "{} requires an API key; set {vars} or enter one in the sidebar",
                self.kind
            )));
        }
        if self.timeout_secs == 0 {
            return Err(LLMError::ConfigurationError(
                "timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self::new(ProviderKind::default())
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model())
            .field("api_base", &self.api_base())
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Construct the provider described by `settings`
pub fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn LLMProvider>> {
    settings.validate()?;
    let key = settings.api_key.clone().unwrap_or_default();

    let provider: Arc<dyn LLMProvider> = match settings.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::with_config(
            GeminiConfig::new(key)
                .with_api_base(settings.api_base())
                .with_timeout(settings.timeout_secs),
        )?),
        ProviderKind::OpenAI => Arc::new(OpenAIProvider::with_config(
            OpenAIConfig::new(key)
                .with_api_base(settings.api_base())
                .with_timeout(settings.timeout_secs),
        )?),
        ProviderKind::DeepSeek => Arc::new(OpenAIProvider::with_config(
            OpenAIConfig::deepseek(key)
                .with_api_base(settings.api_base())
                .with_timeout(settings.timeout_secs),
        )?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(
            settings.api_base(),
            settings.timeout_secs,
        )?),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(" openai ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("DEEPSEEK".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert!("claude".parse::<ProviderKind>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_default_models() {
        assert_eq!(ProviderKind::Gemini.default_model(), "gemini-2.5-flash");
        assert_eq!(ProviderKind::OpenAI.default_model(), "gpt-4o");
        assert_eq!(ProviderKind::Ollama.default_model(), "mistral");
        assert_eq!(ProviderKind::DeepSeek.default_model(), "deepseek-chat");
    }

    #[test]
    fn test_defaults_to_gemini() {
        let settings = ProviderSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.kind, ProviderKind::Gemini);
        assert!(settings.api_key.is_none());
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_gemini_key_fallback() {
        let settings =
            ProviderSettings::from_lookup(lookup(&[("GEMINI_API_KEY", "AIza-2")])).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("AIza-2"));

        let settings = ProviderSettings::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "AIza-1"),
            ("GEMINI_API_KEY", "AIza-2"),
        ]))
        .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("AIza-1"));
    }

    #[test]
    fn test_env_overrides() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "deepseek"),
            ("DEEPSEEK_API_KEY", "ds"),
            ("OPENAI_API_KEY", "ignored"),
            ("LLM_MODEL", "deepseek-reasoner"),
            ("LLM_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(settings.kind, ProviderKind::DeepSeek);
        assert_eq!(settings.api_key.as_deref(), Some("ds"));
        assert_eq!(settings.model(), "deepseek-reasoner");
        assert_eq!(settings.api_base(), "https://api.deepseek.com");
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_bad_timeout() {
        let result = ProviderSettings::from_lookup(lookup(&[("LLM_TIMEOUT_SECS", "soon")]));
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let settings = ProviderSettings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "ollama"),
            ("OLLAMA_HOST", "http://gpu-box:11434"),
        ]))
        .unwrap();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.api_base(), "http://gpu-box:11434");
        assert_eq!(build_provider(&settings).unwrap().name(), "ollama");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = build_provider(&ProviderSettings::new(ProviderKind::OpenAI))
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_blank_key_clears() {
        let settings = ProviderSettings::new(ProviderKind::Gemini)
            .with_api_key("AIza")
            .with_api_key("   ");
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_build_each_hosted_provider() {
        for kind in [ProviderKind::Gemini, ProviderKind::OpenAI, ProviderKind::DeepSeek] {
            let provider = build_provider(&ProviderSettings::new(kind).with_api_key("k")).unwrap();
            assert_eq!(provider.name(), kind.as_str());
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = ProviderSettings::new(ProviderKind::OpenAI).with_api_key("sk-live-123");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains("<redacted>"));
    }
}
