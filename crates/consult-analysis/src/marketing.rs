//! Marketing unit economics

use crate::financial::present;
use crate::formulas as f;
use crate::inputs::MarketingInputs;
use serde::{Deserialize, Serialize};
use std::fmt;

/// LTV:CAC at or above this ratio is considered healthy
pub const HEALTHY_LTV_CAC: f64 = 3.0;

const UNDEFINED: &str = "n/a";

fn percent_or_na(result: crate::error::MetricResult) -> String {
    result.map_or_else(|_| UNDEFINED.to_string(), f::percent)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    #[serde(rename = "CAC")]
    pub cac: Option<f64>,
    /// Marketing spend as a share of revenue, e.g. `"6.2%"`
    #[serde(rename = "Marketing_Spend_Pct")]
    pub marketing_spend_pct: String,
    #[serde(rename = "Marketing_Efficiency_Ratio")]
    pub marketing_efficiency_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionAndValue {
    #[serde(rename = "Retention_Rate")]
    pub retention_rate: String,
    #[serde(rename = "Churn_Rate")]
    pub churn_rate: String,
    #[serde(rename = "Net_Revenue_Retention")]
    pub net_revenue_retention: String,
    #[serde(rename = "Customer_Lifetime_Months")]
    pub customer_lifetime_months: Option<f64>,
    #[serde(rename = "LTV")]
    pub ltv: Option<f64>,
}

/// Verdict on the LTV:CAC ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitEconomicsStatus {
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "Needs Optimization")]
    NeedsOptimization,
}

impl UnitEconomicsStatus {
    /// Classify an LTV:CAC ratio; an undefined ratio needs optimization
    pub fn from_ratio(ltv_cac: Option<f64>) -> Self {
        match ltv_cac {
            Some(ratio) if ratio >= HEALTHY_LTV_CAC => Self::Healthy,
            _ => Self::NeedsOptimization,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::NeedsOptimization => "Needs Optimization",
        }
    }
}

impl fmt::Display for UnitEconomicsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitEconomics {
    #[serde(rename = "LTV_CAC_Ratio")]
    pub ltv_cac_ratio: Option<f64>,
    #[serde(rename = "Payback_Period_Months")]
    pub payback_period_months: Option<f64>,
    #[serde(rename = "Status")]
    pub status: UnitEconomicsStatus,
}

/// Acquisition, retention and unit economics for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingMetrics {
    #[serde(rename = "Acquisition")]
    pub acquisition: Acquisition,
    #[serde(rename = "Retention_and_Value")]
    pub retention: RetentionAndValue,
    #[serde(rename = "Unit_Economics")]
    pub unit_economics: UnitEconomics,
}

impl MarketingMetrics {
    /// Evaluate all marketing formulas against the company's revenue
    pub fn compute(revenue: f64, inputs: &MarketingInputs) -> Self {
        let start = inputs.total_customers_start_period;
        let arpu = inputs.avg_revenue_per_user_monthly;

        let lost = f::customers_lost(start, inputs.new_customers_acquired, inputs.total_customers_end_period);
        let churn = f::churn_rate(lost, start);
        let retention = churn.map(f::retention_rate);
        let nrr = f::net_revenue_retention(start, arpu, inputs.expansion_revenue, lost);

        let unit_margin = f::unit_margin(arpu, inputs.gross_margin_pct);
        let lifetime = churn.and_then(f::customer_lifetime);
        let ltv = churn.and_then(|c| f::lifetime_value(unit_margin, c));
        let cac = f::customer_acquisition_cost(inputs.marketing_spend, inputs.new_customers_acquired);
        let ltv_cac = ltv.and_then(|l| cac.and_then(|c| f::ltv_to_cac(l, c)));

        Self {
            acquisition: Acquisition {
                cac: present(cac, 2),
                marketing_spend_pct: percent_or_na(f::marketing_spend_pct(inputs.marketing_spend, revenue)),
                marketing_efficiency_ratio: present(f::marketing_efficiency(revenue, inputs.marketing_spend), 2),
            },
            retention: RetentionAndValue {
                retention_rate: percent_or_na(retention),
                churn_rate: percent_or_na(churn),
                net_revenue_retention: percent_or_na(nrr),
                customer_lifetime_months: present(lifetime, 1),
                ltv: present(ltv, 2),
            },
            unit_economics: UnitEconomics {
                ltv_cac_ratio: present(ltv_cac, 2),
                payback_period_months: present(cac.and_then(|c| f::payback_period(c, unit_margin)), 1),
                status: UnitEconomicsStatus::from_ratio(ltv_cac.ok()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_metric(actual: Option<f64>, expected: f64) {
        let value = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
        assert!(
            (value - expected).abs() < 1e-9,
            "expected {expected}, got {value}"
        );
    }

    #[test]
    fn test_sample_golden_values() {
        let m = MarketingMetrics::compute(1_200_000.0, &MarketingInputs::sample());

        assert_metric(m.acquisition.cac, 250.0);
        assert_metric(m.acquisition.marketing_efficiency_ratio, 16.0);

        assert_eq!(m.retention.retention_rate, "95.0%");
        assert_eq!(m.retention.churn_rate, "5.0%");
        assert_eq!(m.retention.net_revenue_retention, "99.0%");
        assert_metric(m.retention.customer_lifetime_months, 20.0);
        assert_metric(m.retention.ltv, 1950.0);

        assert_metric(m.unit_economics.ltv_cac_ratio, 7.8);
        assert_metric(m.unit_economics.payback_period_months, 2.6);
        assert_eq!(m.unit_economics.status, UnitEconomicsStatus::Healthy);
    }

    #[test]
    fn test_spend_pct_format() {
        let m = MarketingMetrics::compute(1_000_000.0, &MarketingInputs::sample());
        assert_eq!(m.acquisition.marketing_spend_pct, "7.5%");
    }

    #[test]
    fn test_growing_base_has_no_lifetime() {
        let mut inputs = MarketingInputs::sample();
        // Nobody lost: 2000 + 300 = 2300 at period end
        inputs.total_customers_end_period = 2_300.0;

        let m = MarketingMetrics::compute(1_200_000.0, &inputs);
        assert_eq!(m.retention.churn_rate, "0.0%");
        assert_eq!(m.retention.customer_lifetime_months, None);
        assert_eq!(m.retention.ltv, None);
        assert_eq!(m.unit_economics.ltv_cac_ratio, None);
        assert_eq!(m.unit_economics.status, UnitEconomicsStatus::NeedsOptimization);
    }

    #[test]
    fn test_no_starting_customers() {
        let mut inputs = MarketingInputs::sample();
        inputs.total_customers_start_period = 0.0;
        inputs.total_customers_end_period = 300.0;

        let m = MarketingMetrics::compute(1_200_000.0, &inputs);
        assert_eq!(m.retention.churn_rate, "n/a");
        assert_eq!(m.retention.retention_rate, "n/a");
        assert_eq!(m.retention.net_revenue_retention, "n/a");
        assert!(m.acquisition.cac.is_some());
    }

    #[test]
    fn test_no_new_customers() {
        let mut inputs = MarketingInputs::sample();
        inputs.new_customers_acquired = 0.0;
        inputs.total_customers_end_period = 1_900.0;

        let m = MarketingMetrics::compute(1_200_000.0, &inputs);
        assert_eq!(m.acquisition.cac, None);
        assert_eq!(m.unit_economics.payback_period_months, None);
        assert_eq!(m.unit_economics.ltv_cac_ratio, None);
        assert!(m.retention.ltv.is_some());
    }

    #[test]
    fn test_zero_revenue_and_spend() {
        let mut inputs = MarketingInputs::sample();
        inputs.marketing_spend = 0.0;

        let m = MarketingMetrics::compute(0.0, &inputs);
        assert_eq!(m.acquisition.marketing_spend_pct, "n/a");
        assert_eq!(m.acquisition.marketing_efficiency_ratio, None);
    }

    #[test]
    fn test_status_threshold() {
        assert_eq!(
            UnitEconomicsStatus::from_ratio(Some(3.0)),
            UnitEconomicsStatus::Healthy
        );
        assert_eq!(
            UnitEconomicsStatus::from_ratio(Some(2.99)),
            UnitEconomicsStatus::NeedsOptimization
        );
        assert_eq!(
            UnitEconomicsStatus::from_ratio(None),
            UnitEconomicsStatus::NeedsOptimization
        );
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_value(MarketingMetrics::compute(
            1_200_000.0,
            &MarketingInputs::sample(),
        ))
        .unwrap();

        assert_eq!(json["Unit_Economics"]["Status"], "Healthy");
        assert_eq!(json["Retention_and_Value"]["Churn_Rate"], "5.0%");
        assert!(json["Acquisition"]["CAC"].is_number());
    }
}
