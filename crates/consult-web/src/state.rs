//! Shared application state

use crate::error::WebError;
use crate::pages::Pages;
use crate::session::SessionStore;
use consult_analysis::{Consultant, ConsultantConfig};
use consult_llm::{LLMProvider, ProviderKind, ProviderSettings, build_provider};
use consult_utils::AppConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Turns provider settings into a live provider
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderSettings) -> consult_llm::Result<Arc<dyn LLMProvider>> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub(crate) pages: Arc<Pages>,
    /// Startup settings, used by sessions that never touched the sidebar
    default_settings: Arc<ProviderSettings>,
    /// Per-provider baselines (credentials from the environment) for sidebar switches
    baselines: Arc<HashMap<ProviderKind, ProviderSettings>>,
    factory: ProviderFactory,
}

impl AppState {
    /// State with the given startup settings and no other credentials
    pub fn new(config: AppConfig, default_settings: ProviderSettings) -> Result<Self, WebError> {
        let baselines = ProviderKind::ALL
            .into_iter()
            .map(|kind| {
                let baseline = if kind == default_settings.kind {
                    default_settings.clone()
                } else {
                    inherit(ProviderSettings::new(kind), &default_settings)
                };
                (kind, baseline)
            })
            .collect();

        Self::with_baselines(config, default_settings, baselines)
    }

    /// State built from the process environment
    ///
    /// Every provider's credential is read up front so that switching
    /// provider in the sidebar picks up keys from `.env` as well.
    pub fn from_env(config: AppConfig) -> Result<Self, WebError> {
        let default_settings = ProviderSettings::from_env()
            .map_err(|e| WebError::Configuration(e.to_string()))?;

        let mut baselines = HashMap::new();
        for kind in ProviderKind::ALL {
            let baseline = if kind == default_settings.kind {
                default_settings.clone()
            } else {
                let mut settings = ProviderSettings::for_kind_from_env(kind)
                    .map_err(|e| WebError::Configuration(e.to_string()))?;
                // LLM_MODEL and LLM_API_BASE belong to the startup provider
                settings.model = None;
                settings.api_base = match kind {
                    ProviderKind::Ollama => consult_utils::env_var("OLLAMA_HOST"),
                    _ => None,
                };
                settings
            };
            baselines.insert(kind, baseline);
        }

        Self::with_baselines(config, default_settings, baselines)
    }

    fn with_baselines(
        config: AppConfig,
        default_settings: ProviderSettings,
        baselines: HashMap<ProviderKind, ProviderSettings>,
    ) -> Result<Self, WebError> {
        Ok(Self {
            config: Arc::new(config),
            sessions: SessionStore::new(),
            pages: Arc::new(Pages::new()?),
            default_settings: Arc::new(default_settings),
            baselines: Arc::new(baselines),
            factory: Arc::new(build_provider),
        })
    }

    /// Replace how providers are constructed
    pub fn with_provider_factory(mut self, factory: ProviderFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn default_settings(&self) -> &ProviderSettings {
        &self.default_settings
    }

    /// Starting point when a session switches to `kind`
    pub fn baseline(&self, kind: ProviderKind) -> ProviderSettings {
        self.baselines
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| inherit(ProviderSettings::new(kind), &self.default_settings))
    }

    /// Consultant for the given settings
    pub fn consultant(&self, settings: &ProviderSettings) -> consult_analysis::Result<Consultant> {
        settings.validate()?;
        let provider = (self.factory)(settings)?;
        Consultant::new(provider, ConsultantConfig::from_settings(settings))
    }
}

/// Carry the generation parameters of `from` over to another provider
fn inherit(mut settings: ProviderSettings, from: &ProviderSettings) -> ProviderSettings {
    settings.timeout_secs = from.timeout_secs;
    settings.temperature = from.temperature;
    settings.max_tokens = from.max_tokens;
    settings
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("default_settings", &self.default_settings)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_for_other_provider_has_no_key() {
        let state = AppState::new(
            AppConfig::default(),
            ProviderSettings::new(ProviderKind::Gemini)
                .with_api_key("g-key")
                .with_model("gemini-2.5-pro")
                .with_timeout(30),
        )
        .unwrap();

        let gemini = state.baseline(ProviderKind::Gemini);
        assert_eq!(gemini.model(), "gemini-2.5-pro");
        assert_eq!(gemini.api_key.as_deref(), Some("g-key"));

        let openai = state.baseline(ProviderKind::OpenAI);
        assert_eq!(openai.model(), "gpt-4o");
        assert!(openai.api_key.is_none());
        assert_eq!(openai.timeout_secs, 30);
    }

    #[test]
    fn test_consultant_requires_key() {
        let state = AppState::new(AppConfig::default(), ProviderSettings::new(ProviderKind::DeepSeek)).unwrap();
        let err = state.consultant(state.default_settings()).unwrap_err();
        assert!(err.is_configuration());
    }
}
