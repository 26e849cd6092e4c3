//! Terminal rendering of metrics and reports

use anyhow::{Context, Result};
use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// One row per metric, grouped by section, in serialization order
///
/// Undefined ratios (serialized as null) show as `n/a`.
pub fn metrics_table(metrics: &impl Serialize) -> serde_json::Result<Table> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Section", "Metric", "Value"]);

    if let Value::Object(sections) = serde_json::to_value(metrics)? {
        for (section, entries) in sections {
            let section = section.replace('_', " ");
            match entries {
                Value::Object(entries) => {
                    for (name, value) in entries {
                        table.add_row(vec![section.clone(), name.replace('_', " "), display_value(&value)]);
                    }
                }
                other => {
                    table.add_row(vec![String::new(), section, display_value(&other)]);
                }
            }
        }
    }

    Ok(table)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "n/a".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print to stdout, or write to `path` when given
pub fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use consult_analysis::{BusinessInputs, FinancialMetrics, MarketingMetrics};

    #[test]
    fn test_financial_table_rows() {
        let metrics = FinancialMetrics::compute(&BusinessInputs::sample().financial);
        let rendered = metrics_table(&metrics).unwrap().to_string();

        assert!(rendered.contains("Liquidity"));
        assert!(rendered.contains("DuPont Breakdown"));
        assert!(rendered.contains("6.18"));
        assert!(rendered.contains("EV EBITDA"));
    }

    #[test]
    fn test_undefined_ratio_shows_na() {
        let mut inputs = BusinessInputs::sample().financial;
        inputs.interest_expense = 0.0;
        let rendered = metrics_table(&FinancialMetrics::compute(&inputs)).unwrap().to_string();

        let tie_row = rendered.lines().find(|line| line.contains("TIE")).unwrap();
        assert!(tie_row.contains("n/a"));
    }

    #[test]
    fn test_marketing_strings_unquoted() {
        let inputs = BusinessInputs::sample();
        let metrics = MarketingMetrics::compute(inputs.revenue(), &inputs.marketing);
        let rendered = metrics_table(&metrics).unwrap().to_string();

        assert!(rendered.contains("Healthy"));
        assert!(!rendered.contains("\"Healthy\""));
        assert!(rendered.contains("5.0%"));
    }
}
