//! Consultant prompt templates
//!
//! Three templates are registered under `consult.cfo`, `consult.cmo` and
//! `consult.ceo`. Metrics are embedded as pretty-printed JSON so that every
//! computed value appears verbatim in the prompt.

use crate::error::Result;
use crate::financial::FinancialMetrics;
use crate::marketing::MarketingMetrics;
use consult_prompt::{JinjaTemplate, PromptRegistry};
use serde_json::json;

pub const CFO_PROMPT: &str = "consult.cfo";
pub const CMO_PROMPT: &str = "consult.cmo";
pub const CEO_PROMPT: &str = "consult.ceo";

const CFO_TEMPLATE: &str = r"You are a Senior Strategic Business Consultant and Fractional CFO. I am going to provide you with a JSON object containing the financial ratios of my business.

Your Task:

Executive Summary: Give me a 3-sentence 'vibe check' on the company's health.

The Red Flags: Identify any ratios that suggest liquidity, solvency, or efficiency risks.

The Green Flags: What are we doing exceptionally well?

Operational Advice: Based on the 'Operational' and 'DuPont' sections, give me 3 actionable steps to improve profitability or cash flow.

Benchmark Comparison: Compare these to standard healthy industry benchmarks (assume a general mid-market manufacturing/retail context).

A null value means the ratio is undefined for these figures (its denominator is zero).

The Data: {{ data }}";

const CMO_TEMPLATE: &str = r#"You are a data-driven Chief Marketing Officer (CMO) with a background in Growth Engineering and Unit Economics.

Task: Analyze the provided Marketing & Customer Acquisition data and provide a high-level strategic evaluation.

Please structure your response as follows:

The Efficiency Score: On a scale of 1-10, how healthy is this growth engine? (Base this heavily on the LTV:CAC and Payback Period).

Growth vs. Burn: Are we spending too much to acquire customers, or are we being too conservative?

The Leaking Bucket Check: Analyze the Churn and Retention metrics. Is our growth sustainable, or are we losing customers too fast to keep the "bucket" full?

CMO Recommendations: Provide 3 specific strategies to either:
- Optimize CAC (if the payback period is too long).
- Increase LTV (if the margin or retention is low).
- Scale Spend (if the LTV:CAC is >3 and we should be "pouring gas on the fire").

Financial Alignment: Briefly explain how these marketing metrics will impact the company's "Bottom Line" Net Income over the next 6 months.

The Data for Analysis: {{ data }}"#;

const CEO_TEMPLATE: &str = r#"You are the CEO of a high-growth company. You are presiding over a board meeting with your CFO and CMO.

The Objective: Synthesize the Financial Report and the Marketing Report to determine the company's "True North." You need to identify if the growth strategy is sustainable or if the company is at risk.

Analysis Requirements:

The Alignment Audit: Is the Marketing department spending cash at a rate that the Balance Sheet can support? Point out any friction between Marketing Spend and Net Income/Cash Reserves.

Unit Economics vs. Overhead: The CMO reports on LTV/CAC (unit level), but the CFO reports on OpEx (company level). Are we "profitable on a unit basis" but "losing money on a GAAP basis"? Explain what this means for our runway.

The "Growth-Profitability" Seesaw: Should we:
- Aggressive Growth: Pour more cash into marketing because the LTV/CAC and ROE justify it?
- Operational Efficiency: Freeze marketing spend and focus on fixing the "clogged" inventory/assets identified by the CFO?
- Capital Raise: Is our current trajectory going to require a debt or equity raise in the next 6-12 months?

CEO Directive: Give 3 high-level directives. These should be "Orders" to your CFO and CMO to get them in sync.

CFO DATA (Financials): {{ financial_report }}

CMO DATA (Marketing): {{ marketing_report }}"#;

/// Register the CFO, CMO and CEO templates
pub fn register_prompts(registry: &PromptRegistry) -> consult_prompt::Result<()> {
    registry.register(JinjaTemplate::new(CFO_PROMPT, CFO_TEMPLATE)?);
    registry.register(JinjaTemplate::new(CMO_PROMPT, CMO_TEMPLATE)?);
    registry.register(JinjaTemplate::new(CEO_PROMPT, CEO_TEMPLATE)?);
    Ok(())
}

/// A registry holding only the consultant prompts
pub fn default_registry() -> consult_prompt::Result<PromptRegistry> {
    let registry = PromptRegistry::new();
    register_prompts(&registry)?;
    Ok(registry)
}

pub fn build_financial_prompt(registry: &PromptRegistry, metrics: &FinancialMetrics) -> Result<String> {
    let data = serde_json::to_string_pretty(metrics)?;
    Ok(registry.render(CFO_PROMPT, &json!({ "data": data }))?)
}

pub fn build_marketing_prompt(registry: &PromptRegistry, metrics: &MarketingMetrics) -> Result<String> {
    let data = serde_json::to_string_pretty(metrics)?;
    Ok(registry.render(CMO_PROMPT, &json!({ "data": data }))?)
}

/// Board-meeting prompt fed with the two prior narratives
pub fn build_ceo_prompt(
    registry: &PromptRegistry,
    financial_report: &str,
    marketing_report: &str,
) -> Result<String> {
    Ok(registry.render(
        CEO_PROMPT,
        &json!({
            "financial_report": financial_report,
            "marketing_report": marketing_report,
        }),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::BusinessInputs;
    use serde_json::Value;

    /// Every `"key": value` leaf of the metrics, as it is printed in pretty JSON
    fn leaf_lines(value: &Value, out: &mut Vec<String>) {
        if let Value::Object(map) = value {
            for (key, child) in map {
                if child.is_object() {
                    leaf_lines(child, out);
                } else {
                    out.push(format!("\"{key}\": {child}"));
                }
            }
        }
    }

    #[test]
    fn test_register_all_prompts() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.list(), vec![CEO_PROMPT, CFO_PROMPT, CMO_PROMPT]);
    }

    #[test]
    fn test_financial_prompt_contains_every_metric() {
        let registry = default_registry().unwrap();
        let metrics = FinancialMetrics::compute(&BusinessInputs::sample().financial);
        let prompt = build_financial_prompt(&registry, &metrics).unwrap();

        let mut leaves = Vec::new();
        leaf_lines(&serde_json::to_value(&metrics).unwrap(), &mut leaves);
        assert_eq!(leaves.len(), 29);
        for leaf in leaves {
            assert!(prompt.contains(&leaf), "missing {leaf}");
        }

        assert!(prompt.starts_with("You are a Senior Strategic Business Consultant"));
        assert!(prompt.contains("\"Current\": 6.18"));
        assert!(prompt.contains("\"P/E\": 11.04"));
    }

    #[test]
    fn test_marketing_prompt_contains_every_metric() {
        let registry = default_registry().unwrap();
        let inputs = BusinessInputs::sample();
        let metrics = MarketingMetrics::compute(inputs.revenue(), &inputs.marketing);
        let prompt = build_marketing_prompt(&registry, &metrics).unwrap();

        let mut leaves = Vec::new();
        leaf_lines(&serde_json::to_value(&metrics).unwrap(), &mut leaves);
        assert_eq!(leaves.len(), 11);
        for leaf in leaves {
            assert!(prompt.contains(&leaf), "missing {leaf}");
        }

        assert!(prompt.contains("\"Status\": \"Healthy\""));
        assert!(prompt.contains("\"Churn_Rate\": \"5.0%\""));
    }

    #[test]
    fn test_undefined_metric_is_null_in_prompt() {
        let registry = default_registry().unwrap();
        let mut inputs = BusinessInputs::sample().financial;
        inputs.interest_expense = 0.0;

        let prompt = build_financial_prompt(&registry, &FinancialMetrics::compute(&inputs)).unwrap();
        assert!(prompt.contains("\"TIE\": null"));
    }

    #[test]
    fn test_ceo_prompt_embeds_reports() {
        let registry = default_registry().unwrap();
        let prompt = build_ceo_prompt(&registry, "CFO says <cash is fine>", "CMO says scale").unwrap();

        assert!(prompt.contains("CFO DATA (Financials): CFO says <cash is fine>"));
        assert!(prompt.contains("CMO DATA (Marketing): CMO says scale"));
        assert!(prompt.contains("\"True North.\""));
    }
}
