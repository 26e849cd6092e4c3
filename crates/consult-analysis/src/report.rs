//! Analysis report types

use crate::financial::FinancialMetrics;
use crate::marketing::MarketingMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which reports to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// CFO, CMO and the CEO synthesis of both
    #[default]
    Full,
    FinancialOnly,
    MarketingOnly,
}

impl AnalysisKind {
    pub const ALL: [Self; 3] = [Self::Full, Self::FinancialOnly, Self::MarketingOnly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::FinancialOnly => "financial_only",
            Self::MarketingOnly => "marketing_only",
        }
    }

    /// Label shown in the UI
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "Full Analysis (Financial + Marketing + CEO)",
            Self::FinancialOnly => "Financial Only",
            Self::MarketingOnly => "Marketing Only",
        }
    }

    pub fn includes_financial(&self) -> bool {
        matches!(self, Self::Full | Self::FinancialOnly)
    }

    pub fn includes_marketing(&self) -> bool {
        matches!(self, Self::Full | Self::MarketingOnly)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full" => Ok(Self::Full),
            "financial" | "financial_only" => Ok(Self::FinancialOnly),
            "marketing" | "marketing_only" => Ok(Self::MarketingOnly),
            other => Err(format!(
                "unknown analysis kind '{other}' (expected full, financial or marketing)"
            )),
        }
    }
}

/// Metrics and narratives produced by one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub kind: AnalysisKind,
    pub financial_metrics: Option<FinancialMetrics>,
    pub marketing_metrics: Option<MarketingMetrics>,
    pub financial_report: Option<String>,
    pub marketing_report: Option<String>,
    pub ceo_report: Option<String>,
    /// Provider that produced the narratives
    pub provider: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(kind: AnalysisKind, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            financial_metrics: None,
            marketing_metrics: None,
            financial_report: None,
            marketing_report: None,
            ceo_report: None,
            provider: provider.into(),
            model: model.into(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_financial(mut self, metrics: FinancialMetrics, report: String) -> Self {
        self.financial_metrics = Some(metrics);
        self.financial_report = Some(report);
        self
    }

    pub fn with_marketing(mut self, metrics: MarketingMetrics, report: String) -> Self {
        self.marketing_metrics = Some(metrics);
        self.marketing_report = Some(report);
        self
    }

    pub fn with_ceo(mut self, report: String) -> Self {
        self.ceo_report = Some(report);
        self
    }

    /// Render the report as a Markdown document
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# AI Business Consultant Report\n\n");
        out.push_str(&format!(
            "_{} | {} / {} | {}_\n",
            self.kind.label(),
            self.provider,
            self.model,
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        for (title, body) in [
            ("CFO Financial Analysis", &self.financial_report),
            ("CMO Marketing Analysis", &self.marketing_report),
            ("CEO Business Synthesis", &self.ceo_report),
        ] {
            if let Some(body) = body {
                out.push_str(&format!("\n## {title}\n\n{}\n", body.trim_end()));
            }
        }

        let metrics = [
            ("Financial Metrics", self.financial_metrics.as_ref().and_then(|m| serde_json::to_string_pretty(m).ok())),
            ("Marketing Metrics", self.marketing_metrics.as_ref().and_then(|m| serde_json::to_string_pretty(m).ok())),
        ];
        if metrics.iter().any(|(_, json)| json.is_some()) {
            out.push_str("\n## Raw Metrics\n");
            for (title, json) in metrics {
                if let Some(json) = json {
                    out.push_str(&format!("\n### {title}\n\n```json\n{json}\n```\n"));
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::BusinessInputs;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("full".parse::<AnalysisKind>().unwrap(), AnalysisKind::Full);
        assert_eq!(
            "Financial".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::FinancialOnly
        );
        assert_eq!(
            "marketing-only".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::MarketingOnly
        );
        assert!("everything".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_kind_serde_matches_as_str() {
        for kind in AnalysisKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
            assert_eq!(kind.as_str().parse::<AnalysisKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_sections() {
        assert!(AnalysisKind::Full.includes_financial());
        assert!(AnalysisKind::Full.includes_marketing());
        assert!(!AnalysisKind::FinancialOnly.includes_marketing());
        assert!(!AnalysisKind::MarketingOnly.includes_financial());
    }

    #[test]
    fn test_markdown_only_contains_present_sections() {
        let inputs = BusinessInputs::sample();
        let report = AnalysisReport::new(AnalysisKind::FinancialOnly, "gemini", "gemini-2.5-flash")
            .with_financial(
                FinancialMetrics::compute(&inputs.financial),
                "Liquidity is strong.\n".to_string(),
            );

        let md = report.to_markdown();
        assert!(md.starts_with("# AI Business Consultant Report"));
        assert!(md.contains("## CFO Financial Analysis\n\nLiquidity is strong.\n"));
        assert!(!md.contains("CMO Marketing Analysis"));
        assert!(!md.contains("CEO Business Synthesis"));
        assert!(md.contains("### Financial Metrics"));
        assert!(md.contains("\"Current\": 6.18"));
        assert!(!md.contains("### Marketing Metrics"));
    }

    #[test]
    fn test_report_json_round_trip_keeps_narratives() {
        let report = AnalysisReport::new(AnalysisKind::Full, "ollama", "mistral").with_ceo("Go.".into());
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();

        assert_eq!(back.kind, AnalysisKind::Full);
        assert_eq!(back.ceo_report.as_deref(), Some("Go."));
        assert_eq!(back.generated_at, report.generated_at);
    }
}
