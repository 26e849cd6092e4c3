//! Business input records
//!
//! [`BusinessInputs`] bundles the income statement, balance sheet and market
//! figures ([`FinancialInputs`]) with the customer acquisition figures
//! ([`MarketingInputs`]). Records arrive either as serde documents (JSON or
//! TOML) or as raw form fields through a [`FieldSource`], and are validated
//! against the rules in each [`FieldSpec`].

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Range rule applied to a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Any finite number (net income may be a loss)
    Any,
    /// Zero or greater
    NonNegative,
    /// One or greater
    AtLeastOne,
    /// Between 0 and 1 inclusive
    Fraction,
}

impl FieldRule {
    fn check(self, value: f64) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::NonNegative if value < 0.0 => Some("must not be negative"),
            Self::AtLeastOne if value < 1.0 => Some("must be at least 1"),
            Self::Fraction if !(0.0..=1.0).contains(&value) => Some("must be between 0 and 1"),
            _ => None,
        }
    }
}

/// Description of one input field: its key, label and rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Serde and form key
    pub key: &'static str,
    /// Human-readable label used in forms and error messages
    pub label: &'static str,
    /// Form group the field belongs to
    pub group: &'static str,
    pub rule: FieldRule,
    /// Value used when the field is left empty; `None` means required
    pub default: Option<f64>,
}

impl FieldSpec {
    const fn required(
        key: &'static str,
        label: &'static str,
        group: &'static str,
        rule: FieldRule,
    ) -> Self {
        Self {
            key,
            label,
            group,
            rule,
            default: None,
        }
    }

    const fn optional(
        key: &'static str,
        label: &'static str,
        group: &'static str,
        rule: FieldRule,
        default: f64,
    ) -> Self {
        Self {
            key,
            label,
            group,
            rule,
            default: Some(default),
        }
    }

    /// Check a value against this field's rule
    pub fn check(&self, value: f64) -> Result<f64, InputError> {
        if !value.is_finite() {
            return Err(InputError::Invalid {
                field: self.label,
                value: value.to_string(),
            });
        }
        match self.rule.check(value) {
            Some(constraint) => Err(InputError::OutOfRange {
                field: self.label,
                constraint,
            }),
            None => Ok(value),
        }
    }

    /// Read, parse and check this field from a source
    ///
    /// Thousands separators (`,` and `_`) and a leading `$` are accepted.
    pub fn read(&self, source: &(impl FieldSource + ?Sized)) -> Result<f64, InputError> {
        let raw = source.field(self.key).map(str::trim).filter(|s| !s.is_empty());

        let value = match raw {
            None => self
                .default
                .ok_or(InputError::Missing { field: self.label })?,
            Some(raw) => {
                let cleaned: String = raw
                    .trim_start_matches('$')
                    .chars()
                    .filter(|c| *c != ',' && *c != '_')
                    .collect();
                cleaned.parse::<f64>().map_err(|_| InputError::Invalid {
                    field: self.label,
                    value: raw.to_string(),
                })?
            }
        };

        self.check(value)
    }
}

/// Anything that can hand out raw string values by field key
pub trait FieldSource {
    fn field(&self, key: &str) -> Option<&str>;
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl FieldSource for BTreeMap<String, String> {
    fn field(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl FieldSource for [(&str, &str)] {
    fn field(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

const INCOME: &str = "Income Statement";
const BALANCE: &str = "Balance Sheet";
const MARKET: &str = "Market Data";
const MARKETING: &str = "Marketing";

/// Financial fields in form order
pub const FINANCIAL_FIELDS: [FieldSpec; 22] = [
    FieldSpec::required("revenue", "Revenue", INCOME, FieldRule::NonNegative),
    FieldSpec::required("cogs", "Cost of Goods Sold", INCOME, FieldRule::NonNegative),
    FieldSpec::required("gross_profit", "Gross Profit", INCOME, FieldRule::NonNegative),
    FieldSpec::required("sales_and_marketing", "Sales & Marketing", INCOME, FieldRule::NonNegative),
    FieldSpec::required("research_and_development", "R&D", INCOME, FieldRule::NonNegative),
    FieldSpec::required("general_and_administrative", "General & Admin", INCOME, FieldRule::NonNegative),
    FieldSpec::required("ebitda", "EBITDA", INCOME, FieldRule::NonNegative),
    FieldSpec::required(
        "depreciation_and_amortization",
        "Depreciation & Amortization",
        INCOME,
        FieldRule::NonNegative,
    ),
    FieldSpec::required("ebit", "EBIT", INCOME, FieldRule::NonNegative),
    FieldSpec::required("interest_expense", "Interest Expense", INCOME, FieldRule::NonNegative),
    FieldSpec::required("net_income", "Net Income", INCOME, FieldRule::Any),
    FieldSpec::required("cash_equivalents", "Cash & Equivalents", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("accounts_receivable", "Accounts Receivable", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("inventory", "Inventory", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("fixed_assets_ppe", "Fixed Assets (PP&E)", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("intangible_assets", "Intangible Assets", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("accounts_payable", "Accounts Payable", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("accrued_expenses", "Accrued Expenses", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("long_term_debt", "Long-term Debt", BALANCE, FieldRule::NonNegative),
    FieldSpec::required("shareholders_equity", "Shareholders' Equity", BALANCE, FieldRule::NonNegative),
    FieldSpec::optional("stock_price", "Stock Price", MARKET, FieldRule::NonNegative, 0.0),
    FieldSpec::optional("shares_outstanding", "Shares Outstanding", MARKET, FieldRule::AtLeastOne, 1.0),
];

/// Marketing fields in form order
pub const MARKETING_FIELDS: [FieldSpec; 7] = [
    FieldSpec::required("marketing_spend", "Marketing Spend", MARKETING, FieldRule::NonNegative),
    FieldSpec::required("new_customers_acquired", "New Customers Acquired", MARKETING, FieldRule::NonNegative),
    FieldSpec::required(
        "total_customers_start_period",
        "Customers at Start of Period",
        MARKETING,
        FieldRule::NonNegative,
    ),
    FieldSpec::required(
        "total_customers_end_period",
        "Customers at End of Period",
        MARKETING,
        FieldRule::NonNegative,
    ),
    FieldSpec::required(
        "avg_revenue_per_user_monthly",
        "Avg Revenue Per User/Month",
        MARKETING,
        FieldRule::NonNegative,
    ),
    FieldSpec::required("gross_margin_pct", "Gross Margin % (0-1)", MARKETING, FieldRule::Fraction),
    FieldSpec::required("expansion_revenue", "Expansion Revenue", MARKETING, FieldRule::NonNegative),
];

fn default_stock_price() -> f64 {
    0.0
}

fn default_shares_outstanding() -> f64 {
    1.0
}

/// Income statement, balance sheet and market figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputs {
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub sales_and_marketing: f64,
    pub research_and_development: f64,
    pub general_and_administrative: f64,
    pub ebitda: f64,
    pub depreciation_and_amortization: f64,
    pub ebit: f64,
    pub interest_expense: f64,
    pub net_income: f64,
    pub cash_equivalents: f64,
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub fixed_assets_ppe: f64,
    pub intangible_assets: f64,
    pub accounts_payable: f64,
    pub accrued_expenses: f64,
    pub long_term_debt: f64,
    pub shareholders_equity: f64,
    #[serde(default = "default_stock_price")]
    pub stock_price: f64,
    #[serde(default = "default_shares_outstanding")]
    pub shares_outstanding: f64,
}

impl FinancialInputs {
    /// Field values paired with their specs, in [`FINANCIAL_FIELDS`] order
    pub fn values(&self) -> [(FieldSpec, f64); 22] {
        let f = FINANCIAL_FIELDS;
        [
            (f[0], self.revenue),
            (f[1], self.cogs),
            (f[2], self.gross_profit),
            (f[3], self.sales_and_marketing),
            (f[4], self.research_and_development),
            (f[5], self.general_and_administrative),
            (f[6], self.ebitda),
            (f[7], self.depreciation_and_amortization),
            (f[8], self.ebit),
            (f[9], self.interest_expense),
            (f[10], self.net_income),
            (f[11], self.cash_equivalents),
            (f[12], self.accounts_receivable),
            (f[13], self.inventory),
            (f[14], self.fixed_assets_ppe),
            (f[15], self.intangible_assets),
            (f[16], self.accounts_payable),
            (f[17], self.accrued_expenses),
            (f[18], self.long_term_debt),
            (f[19], self.shareholders_equity),
            (f[20], self.stock_price),
            (f[21], self.shares_outstanding),
        ]
    }

    /// Validate every field, reporting the first failure
    pub fn validate(&self) -> Result<(), InputError> {
        self.values()
            .iter()
            .try_for_each(|(spec, value)| spec.check(*value).map(|_| ()))
    }

    /// Parse and validate from raw form fields
    pub fn from_fields(source: &(impl FieldSource + ?Sized)) -> Result<Self, InputError> {
        let f = FINANCIAL_FIELDS;
        Ok(Self {
            revenue: f[0].read(source)?,
            cogs: f[1].read(source)?,
            gross_profit: f[2].read(source)?,
            sales_and_marketing: f[3].read(source)?,
            research_and_development: f[4].read(source)?,
            general_and_administrative: f[5].read(source)?,
            ebitda: f[6].read(source)?,
            depreciation_and_amortization: f[7].read(source)?,
            ebit: f[8].read(source)?,
            interest_expense: f[9].read(source)?,
            net_income: f[10].read(source)?,
            cash_equivalents: f[11].read(source)?,
            accounts_receivable: f[12].read(source)?,
            inventory: f[13].read(source)?,
            fixed_assets_ppe: f[14].read(source)?,
            intangible_assets: f[15].read(source)?,
            accounts_payable: f[16].read(source)?,
            accrued_expenses: f[17].read(source)?,
            long_term_debt: f[18].read(source)?,
            shareholders_equity: f[19].read(source)?,
            stock_price: f[20].read(source)?,
            shares_outstanding: f[21].read(source)?,
        })
    }

    /// Demo company figures
    pub fn sample() -> Self {
        Self {
            revenue: 1_200_000.0,
            cogs: 420_000.0,
            gross_profit: 780_000.0,
            sales_and_marketing: 200_000.0,
            research_and_development: 120_000.0,
            general_and_administrative: 150_000.0,
            ebitda: 310_000.0,
            depreciation_and_amortization: 40_000.0,
            ebit: 270_000.0,
            interest_expense: 12_000.0,
            net_income: 203_820.0,
            cash_equivalents: 250_000.0,
            accounts_receivable: 95_000.0,
            inventory: 180_000.0,
            fixed_assets_ppe: 400_000.0,
            intangible_assets: 100_000.0,
            accounts_payable: 60_000.0,
            accrued_expenses: 25_000.0,
            long_term_debt: 350_000.0,
            shareholders_equity: 600_000.0,
            stock_price: 45.0,
            shares_outstanding: 50_000.0,
        }
    }
}

/// Customer acquisition and retention figures for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingInputs {
    pub marketing_spend: f64,
    pub new_customers_acquired: f64,
    pub total_customers_start_period: f64,
    pub total_customers_end_period: f64,
    pub avg_revenue_per_user_monthly: f64,
    pub gross_margin_pct: f64,
    pub expansion_revenue: f64,
}

impl MarketingInputs {
    /// Field values paired with their specs, in [`MARKETING_FIELDS`] order
    pub fn values(&self) -> [(FieldSpec, f64); 7] {
        let f = MARKETING_FIELDS;
        [
            (f[0], self.marketing_spend),
            (f[1], self.new_customers_acquired),
            (f[2], self.total_customers_start_period),
            (f[3], self.total_customers_end_period),
            (f[4], self.avg_revenue_per_user_monthly),
            (f[5], self.gross_margin_pct),
            (f[6], self.expansion_revenue),
        ]
    }

    pub fn validate(&self) -> Result<(), InputError> {
        self.values()
            .iter()
            .try_for_each(|(spec, value)| spec.check(*value).map(|_| ()))
    }

    pub fn from_fields(source: &(impl FieldSource + ?Sized)) -> Result<Self, InputError> {
        let f = MARKETING_FIELDS;
        Ok(Self {
            marketing_spend: f[0].read(source)?,
            new_customers_acquired: f[1].read(source)?,
            total_customers_start_period: f[2].read(source)?,
            total_customers_end_period: f[3].read(source)?,
            avg_revenue_per_user_monthly: f[4].read(source)?,
            gross_margin_pct: f[5].read(source)?,
            expansion_revenue: f[6].read(source)?,
        })
    }

    pub fn sample() -> Self {
        Self {
            marketing_spend: 75_000.0,
            new_customers_acquired: 300.0,
            total_customers_start_period: 2_000.0,
            total_customers_end_period: 2_200.0,
            avg_revenue_per_user_monthly: 150.0,
            gross_margin_pct: 0.65,
            expansion_revenue: 12_000.0,
        }
    }
}

/// Everything the consultant needs for a full analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInputs {
    pub financial: FinancialInputs,
    pub marketing: MarketingInputs,
}

impl BusinessInputs {
    pub fn new(financial: FinancialInputs, marketing: MarketingInputs) -> Self {
        Self {
            financial,
            marketing,
        }
    }

    /// Validate financial fields first, then marketing fields
    pub fn validate(&self) -> Result<(), InputError> {
        self.financial.validate()?;
        self.marketing.validate()
    }

    /// Parse both records from one flat set of form fields
    pub fn from_fields(source: &(impl FieldSource + ?Sized)) -> Result<Self, InputError> {
        Ok(Self {
            financial: FinancialInputs::from_fields(source)?,
            marketing: MarketingInputs::from_fields(source)?,
        })
    }

    /// The demo dataset used to prefill forms and for `--sample` runs
    pub fn sample() -> Self {
        Self::new(FinancialInputs::sample(), MarketingInputs::sample())
    }

    /// Revenue shared by the marketing analysis
    pub fn revenue(&self) -> f64 {
        self.financial.revenue
    }
}

impl Default for BusinessInputs {
    fn default() -> Self {
        Self::sample()
    }
}
