//! Financial and marketing formulas
//!
//! One function per ratio. Every fallible formula returns a [`MetricResult`]:
//! a zero denominator is [`MetricError::DivisionByZero`], never `inf` or
//! `NaN`. Callers feed unrounded intermediates into dependent formulas and
//! round only for presentation with [`round_to`].

use crate::error::{MetricError, MetricResult};

/// Days in the year used by the interval and days-outstanding measures
pub const DAYS_PER_YEAR: f64 = 365.0;

fn finite(metric: &'static str, value: f64) -> MetricResult {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MetricError::NonFinite { metric })
    }
}

fn ratio(metric: &'static str, numerator: f64, denominator: f64) -> MetricResult {
    if denominator == 0.0 {
        return Err(MetricError::DivisionByZero { metric });
    }
    finite(metric, numerator / denominator)
}

/// Round to `dp` decimal places the way Python's `round` does
///
/// The exact binary value is rounded, with exact ties going to the even digit
/// (`0.125` -> `0.12`). Scaling by `10^dp` first would turn values just above a
/// tie, such as `203820 / 1200000`, into false ties.
pub fn round_to(value: f64, dp: i32) -> f64 {
    let precision = usize::try_from(dp).unwrap_or_default();
    format!("{value:.precision$}").parse().unwrap_or(value)
}

/// Format a fraction as a percentage with one decimal (`0.0625` -> `"6.2%"`)
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

// Balance sheet aggregates

pub fn current_assets(cash: f64, receivables: f64, inventory: f64) -> f64 {
    cash + receivables + inventory
}

pub fn total_assets(current_assets: f64, fixed_assets: f64, intangibles: f64) -> f64 {
    current_assets + fixed_assets + intangibles
}

pub fn current_liabilities(payables: f64, accrued: f64) -> f64 {
    payables + accrued
}

pub fn net_working_capital(current_assets: f64, current_liabilities: f64) -> f64 {
    current_assets - current_liabilities
}

// Liquidity

pub fn current_ratio(current_assets: f64, current_liabilities: f64) -> MetricResult {
    ratio("Current", current_assets, current_liabilities)
}

pub fn quick_ratio(current_assets: f64, inventory: f64, current_liabilities: f64) -> MetricResult {
    ratio("Quick", current_assets - inventory, current_liabilities)
}

pub fn cash_ratio(cash: f64, current_liabilities: f64) -> MetricResult {
    ratio("Cash", cash, current_liabilities)
}

/// Days the current assets could cover cost of goods sold
pub fn interval_measure(current_assets: f64, cogs: f64) -> MetricResult {
    if cogs == 0.0 {
        return Err(MetricError::DivisionByZero { metric: "Interval" });
    }
    ratio("Interval", current_assets, cogs / DAYS_PER_YEAR)
}

// Solvency

pub fn total_debt_ratio(total_assets: f64, equity: f64) -> MetricResult {
    ratio("Debt Ratio", total_assets - equity, total_assets)
}

pub fn equity_multiplier(total_assets: f64, equity: f64) -> MetricResult {
    ratio("Multiplier", total_assets, equity)
}

pub fn long_term_debt_ratio(long_term_debt: f64, equity: f64) -> MetricResult {
    ratio("LTD", long_term_debt, long_term_debt + equity)
}

pub fn times_interest_earned(ebit: f64, interest: f64) -> MetricResult {
    ratio("TIE", ebit, interest)
}

pub fn cash_coverage(ebitda: f64, interest: f64) -> MetricResult {
    ratio("Cash Coverage", ebitda, interest)
}

// Turnover

pub fn total_asset_turnover(revenue: f64, total_assets: f64) -> MetricResult {
    ratio("Total Asset", revenue, total_assets)
}

pub fn nwc_turnover(revenue: f64, net_working_capital: f64) -> MetricResult {
    ratio("NWC", revenue, net_working_capital)
}

pub fn fixed_asset_turnover(revenue: f64, fixed_assets: f64) -> MetricResult {
    ratio("Fixed Asset", revenue, fixed_assets)
}

// Profitability

pub fn gross_margin(gross_profit: f64, revenue: f64) -> MetricResult {
    ratio("Gross Margin", gross_profit, revenue)
}

pub fn profit_margin(net_income: f64, revenue: f64) -> MetricResult {
    ratio("Profit Margin", net_income, revenue)
}

pub fn return_on_assets(net_income: f64, total_assets: f64) -> MetricResult {
    ratio("ROA", net_income, total_assets)
}

pub fn return_on_equity(net_income: f64, equity: f64) -> MetricResult {
    ratio("ROE", net_income, equity)
}

/// ROE rebuilt from its three DuPont levers
pub fn dupont_roe(profit_margin: f64, asset_turnover: f64, equity_multiplier: f64) -> MetricResult {
    finite(
        "Calculated_ROE",
        profit_margin * asset_turnover * equity_multiplier,
    )
}

// Market

pub fn market_cap(stock_price: f64, shares_outstanding: f64) -> f64 {
    stock_price * shares_outstanding
}

/// Price over earnings per share; undefined for zero net income
pub fn price_to_earnings(stock_price: f64, net_income: f64, shares_outstanding: f64) -> MetricResult {
    let eps = ratio("P/E", net_income, shares_outstanding)?;
    ratio("P/E", stock_price, eps)
}

pub fn market_to_book(market_cap: f64, equity: f64) -> MetricResult {
    ratio("Market/Book", market_cap, equity)
}

pub fn price_to_sales(market_cap: f64, revenue: f64) -> MetricResult {
    ratio("Price/Sales", market_cap, revenue)
}

pub fn enterprise_value(market_cap: f64, long_term_debt: f64, cash: f64) -> f64 {
    market_cap + long_term_debt - cash
}

pub fn ev_to_ebitda(enterprise_value: f64, ebitda: f64) -> MetricResult {
    ratio("EV_EBITDA", enterprise_value, ebitda)
}

// Operational

pub fn inventory_turnover(cogs: f64, inventory: f64) -> MetricResult {
    ratio("Inv_Turnover", cogs, inventory)
}

pub fn days_sales_in_inventory(inventory_turnover: f64) -> MetricResult {
    ratio("DSI", DAYS_PER_YEAR, inventory_turnover)
}

pub fn receivables_turnover(revenue: f64, receivables: f64) -> MetricResult {
    ratio("Rec_Turnover", revenue, receivables)
}

pub fn days_sales_outstanding(receivables_turnover: f64) -> MetricResult {
    ratio("DSO", DAYS_PER_YEAR, receivables_turnover)
}

// Marketing

/// Customers lost during the period: `(start + new) - end`
pub fn customers_lost(start: f64, new_customers: f64, end: f64) -> f64 {
    (start + new_customers) - end
}

pub fn churn_rate(customers_lost: f64, start: f64) -> MetricResult {
    ratio("Churn_Rate", customers_lost, start)
}

pub fn retention_rate(churn_rate: f64) -> f64 {
    1.0 - churn_rate
}

/// Net revenue retention against the revenue of the starting customer base
pub fn net_revenue_retention(
    start: f64,
    arpu: f64,
    expansion_revenue: f64,
    customers_lost: f64,
) -> MetricResult {
    let starting_revenue = start * arpu;
    ratio(
        "Net_Revenue_Retention",
        starting_revenue + expansion_revenue - customers_lost * arpu,
        starting_revenue,
    )
}

/// Gross profit per customer per period
pub fn unit_margin(arpu: f64, gross_margin_pct: f64) -> f64 {
    arpu * gross_margin_pct
}

/// Expected customer lifetime in periods, `1 / churn`
pub fn customer_lifetime(churn_rate: f64) -> MetricResult {
    if churn_rate <= 0.0 {
        return Err(MetricError::Undefined {
            metric: "Customer_Lifetime_Months",
            reason: "churn is not positive",
        });
    }
    finite("Customer_Lifetime_Months", 1.0 / churn_rate)
}

pub fn lifetime_value(unit_margin: f64, churn_rate: f64) -> MetricResult {
    if churn_rate <= 0.0 {
        return Err(MetricError::Undefined {
            metric: "LTV",
            reason: "churn is not positive",
        });
    }
    finite("LTV", unit_margin / churn_rate)
}

pub fn customer_acquisition_cost(marketing_spend: f64, new_customers: f64) -> MetricResult {
    ratio("CAC", marketing_spend, new_customers)
}

pub fn ltv_to_cac(ltv: f64, cac: f64) -> MetricResult {
    ratio("LTV_CAC_Ratio", ltv, cac)
}

/// Periods of unit margin needed to earn back the acquisition cost
pub fn payback_period(cac: f64, unit_margin: f64) -> MetricResult {
    ratio("Payback_Period_Months", cac, unit_margin)
}

pub fn marketing_efficiency(revenue: f64, marketing_spend: f64) -> MetricResult {
    ratio("Marketing_Efficiency_Ratio", revenue, marketing_spend)
}

pub fn marketing_spend_pct(marketing_spend: f64, revenue: f64) -> MetricResult {
    ratio("Marketing_Spend_Pct", marketing_spend, revenue)
}
