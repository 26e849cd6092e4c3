//! The consultant: metrics in, CFO/CMO/CEO narratives out

use crate::error::{AnalysisError, Result};
use crate::financial::FinancialMetrics;
use crate::inputs::{BusinessInputs, FINANCIAL_FIELDS, FinancialInputs, MarketingInputs};
use crate::marketing::MarketingMetrics;
use crate::prompts;
use crate::report::{AnalysisKind, AnalysisReport};
use consult_llm::{
    CompletionRequest, LLMProvider, ProviderSettings, build_provider,
    settings::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
};
use consult_prompt::PromptRegistry;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Generation parameters for every report
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultantConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl ConsultantConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Generation parameters taken from provider settings
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            model: settings.model().to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Runs the analysis chain against one LLM provider
///
/// Each report is a single completion request; the CEO synthesis waits for
/// both the CFO and CMO narratives.
pub struct Consultant {
    provider: Arc<dyn LLMProvider>,
    config: ConsultantConfig,
    prompts: Arc<PromptRegistry>,
}

impl Consultant {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ConsultantConfig) -> Result<Self> {
        Ok(Self {
            provider,
            config,
            prompts: Arc::new(prompts::default_registry()?),
        })
    }

    /// Build the provider described by `settings` and wrap it
    ///
    /// Fails with a configuration error when a hosted provider has no key.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let provider = build_provider(settings)?;
        Self::new(provider, ConsultantConfig::from_settings(settings))
    }

    /// Use a custom prompt registry (must contain the `consult.*` templates)
    pub fn with_prompts(mut self, prompts: Arc<PromptRegistry>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn config(&self) -> &ConsultantConfig {
        &self.config
    }

    async fn ask(&self, stage: &'static str, prompt: String) -> Result<String> {
        let request = CompletionRequest::builder(&self.config.model)
            .prompt(prompt)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build();

        info!(stage, "Requesting report");
        let response = self.provider.complete(request).await?;
        info!(
            stage,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "Report received"
        );
        if response.stop_reason.is_truncated() {
            warn!(stage, stop_reason = ?response.stop_reason, "Report was cut short");
        }

        match response.text() {
            Some(text) => Ok(text.to_string()),
            None => {
                warn!(stage, "Provider returned no text");
                Err(AnalysisError::EmptyResponse { stage })
            }
        }
    }

    /// CFO report: financial ratios plus their narrative
    #[instrument(skip_all, fields(provider = %self.provider.name(), model = %self.config.model))]
    pub async fn financial_analysis(
        &self,
        inputs: &FinancialInputs,
    ) -> Result<(FinancialMetrics, String)> {
        inputs.validate()?;
        let metrics = FinancialMetrics::compute(inputs);
        let prompt = prompts::build_financial_prompt(&self.prompts, &metrics)?;
        let report = self.ask("CFO", prompt).await?;
        Ok((metrics, report))
    }

    /// CMO report: unit economics plus their narrative
    #[instrument(skip_all, fields(provider = %self.provider.name(), model = %self.config.model))]
    pub async fn marketing_analysis(
        &self,
        revenue: f64,
        inputs: &MarketingInputs,
    ) -> Result<(MarketingMetrics, String)> {
        FINANCIAL_FIELDS[0].check(revenue)?;
        inputs.validate()?;
        let metrics = MarketingMetrics::compute(revenue, inputs);
        let prompt = prompts::build_marketing_prompt(&self.prompts, &metrics)?;
        let report = self.ask("CMO", prompt).await?;
        Ok((metrics, report))
    }

    /// CEO synthesis of the two department reports
    #[instrument(skip_all, fields(provider = %self.provider.name(), model = %self.config.model))]
    pub async fn ceo_synthesis(&self, financial_report: &str, marketing_report: &str) -> Result<String> {
        let prompt = prompts::build_ceo_prompt(&self.prompts, financial_report, marketing_report)?;
        self.ask("CEO", prompt).await
    }

    /// Full analysis: CFO, then CMO, then CEO
    pub async fn analyze_business(&self, inputs: &BusinessInputs) -> Result<AnalysisReport> {
        self.run(AnalysisKind::Full, inputs).await
    }

    /// Produce the reports selected by `kind`
    ///
    /// The whole input record is validated before the first request is sent.
    pub async fn run(&self, kind: AnalysisKind, inputs: &BusinessInputs) -> Result<AnalysisReport> {
        if let Err(e) = inputs.validate() {
            warn!(%kind, "Rejected input: {e}");
            return Err(e.into());
        }
        info!(%kind, provider = self.provider.name(), "Starting analysis");

        let mut report = AnalysisReport::new(kind, self.provider.name(), &self.config.model);

        if kind.includes_financial() {
            let (metrics, narrative) = self.financial_analysis(&inputs.financial).await?;
            report = report.with_financial(metrics, narrative);
        }
        if kind.includes_marketing() {
            let (metrics, narrative) = self
                .marketing_analysis(inputs.revenue(), &inputs.marketing)
                .await?;
            report = report.with_marketing(metrics, narrative);
        }
        let ceo = match (&report.financial_report, &report.marketing_report) {
            (Some(financial), Some(marketing)) if kind == AnalysisKind::Full => {
                Some(self.ceo_synthesis(financial, marketing).await?)
            }
            _ => None,
        };
        if let Some(ceo) = ceo {
            report = report.with_ceo(ceo);
        }

        info!(%kind, "Analysis complete");
        Ok(report)
    }
}

impl std::fmt::Debug for Consultant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consultant")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use async_trait::async_trait;
    use consult_llm::{CompletionResponse, LLMError, Message, ProviderKind, StopReason, TokenUsage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that answers from a script and records every request
    struct ScriptedProvider {
        replies: Mutex<VecDeque<std::result::Result<String, LLMError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| Ok((*r).to_string())).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(error: LLMError) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(VecDeque::from([Err(error)])),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.messages[0].content.clone())
                .collect()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> consult_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LLMError::RequestFailed("script exhausted".into())))?;
            Ok(CompletionResponse {
                message: Message::assistant(reply),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 20,
                },
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn consultant(provider: Arc<ScriptedProvider>) -> Consultant {
        Consultant::new(provider, ConsultantConfig::new("test-model").with_temperature(0.2)).unwrap()
    }

    #[tokio::test]
    async fn test_full_analysis_runs_three_stages_in_order() {
        let provider = ScriptedProvider::new(&["CFO narrative", "CMO narrative", "CEO directive"]);
        let consultant = consultant(Arc::clone(&provider));

        let report = consultant
            .analyze_business(&BusinessInputs::sample())
            .await
            .unwrap();

        assert_eq!(report.kind, AnalysisKind::Full);
        assert_eq!(report.financial_report.as_deref(), Some("CFO narrative"));
        assert_eq!(report.marketing_report.as_deref(), Some("CMO narrative"));
        assert_eq!(report.ceo_report.as_deref(), Some("CEO directive"));
        assert!(report.financial_metrics.is_some());
        assert!(report.marketing_metrics.is_some());
        assert_eq!(report.provider, "scripted");
        assert_eq!(report.model, "test-model");

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("Fractional CFO"));
        assert!(prompts[1].contains("Chief Marketing Officer"));
        assert!(prompts[2].contains("CFO DATA (Financials): CFO narrative"));
        assert!(prompts[2].contains("CMO DATA (Marketing): CMO narrative"));
    }

    #[tokio::test]
    async fn test_request_parameters() {
        let provider = ScriptedProvider::new(&["ok"]);
        let consultant = consultant(Arc::clone(&provider));

        consultant
            .financial_analysis(&FinancialInputs::sample())
            .await
            .unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].model, "test-model");
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(requests[0].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_financial_only() {
        let provider = ScriptedProvider::new(&["CFO narrative"]);
        let consultant = consultant(Arc::clone(&provider));

        let report = consultant
            .run(AnalysisKind::FinancialOnly, &BusinessInputs::sample())
            .await
            .unwrap();

        assert!(report.financial_report.is_some());
        assert!(report.marketing_metrics.is_none());
        assert!(report.ceo_report.is_none());
        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_marketing_only_uses_financial_revenue() {
        let provider = ScriptedProvider::new(&["CMO narrative"]);
        let consultant = consultant(Arc::clone(&provider));

        let report = consultant
            .run(AnalysisKind::MarketingOnly, &BusinessInputs::sample())
            .await
            .unwrap();

        let metrics = report.marketing_metrics.unwrap();
        assert_eq!(metrics.acquisition.marketing_efficiency_ratio, Some(16.0));
        assert!(report.financial_report.is_none());
        assert!(report.ceo_report.is_none());
        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_marketing_revenue_may_be_zero_but_not_negative() {
        let provider = ScriptedProvider::new(&["CMO narrative"]);
        let consultant = consultant(Arc::clone(&provider));
        let marketing = BusinessInputs::sample().marketing;

        let (metrics, _) = consultant.marketing_analysis(0.0, &marketing).await.unwrap();
        assert_eq!(metrics.acquisition.marketing_spend_pct, "n/a");
        assert_eq!(metrics.acquisition.marketing_efficiency_ratio, Some(0.0));

        let err = consultant.marketing_analysis(-1.0, &marketing).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Input(InputError::OutOfRange { field: "Revenue", .. })
        ));
        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_sends_nothing() {
        let provider = ScriptedProvider::new(&["unused"]);
        let consultant = consultant(Arc::clone(&provider));

        let mut inputs = BusinessInputs::sample();
        inputs.marketing.gross_margin_pct = 1.5;

        let err = consultant.run(AnalysisKind::Full, &inputs).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Input(InputError::OutOfRange { field: "Gross Margin % (0-1)", .. })
        ));
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_response() {
        let provider = ScriptedProvider::new(&["   "]);
        let consultant = consultant(provider);

        let err = consultant
            .run(AnalysisKind::FinancialOnly, &BusinessInputs::sample())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResponse { stage: "CFO" }));
    }

    #[tokio::test]
    async fn test_provider_failure_stops_chain() {
        let provider = ScriptedProvider::failing(LLMError::RateLimitExceeded("slow down".into()));
        let consultant = consultant(Arc::clone(&provider));

        let err = consultant
            .analyze_business(&BusinessInputs::sample())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Llm(LLMError::RateLimitExceeded(_))));
        assert_eq!(provider.prompts().len(), 1);
    }

    #[test]
    fn test_from_settings_requires_key() {
        let err = Consultant::from_settings(&ProviderSettings::new(ProviderKind::OpenAI)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_from_settings_ollama_needs_no_key() {
        let consultant = Consultant::from_settings(&ProviderSettings::new(ProviderKind::Ollama)).unwrap();
        assert_eq!(consultant.provider_name(), "ollama");
        assert_eq!(consultant.config().model, "mistral");
    }
}
