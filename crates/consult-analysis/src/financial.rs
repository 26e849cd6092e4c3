//! Financial ratio report
//!
//! [`FinancialMetrics`] groups the ratios into the seven sections a CFO reads
//! (liquidity, solvency, turnover, profitability, DuPont, market, operational).
//! Serde names match the keys used in prompts and the JSON API.

use crate::error::MetricResult;
use crate::formulas as f;
use crate::inputs::FinancialInputs;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Round a formula result for presentation, `None` when it is undefined
pub(crate) fn present(result: MetricResult, dp: i32) -> Option<f64> {
    match result {
        Ok(value) => Some(f::round_to(value, dp)),
        Err(e) => {
            debug!(metric = e.metric(), "{e}");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liquidity {
    #[serde(rename = "Current")]
    pub current: Option<f64>,
    #[serde(rename = "Quick")]
    pub quick: Option<f64>,
    #[serde(rename = "Cash")]
    pub cash: Option<f64>,
    #[serde(rename = "Interval")]
    pub interval: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solvency {
    #[serde(rename = "Debt Ratio")]
    pub debt_ratio: Option<f64>,
    #[serde(rename = "Multiplier")]
    pub multiplier: Option<f64>,
    #[serde(rename = "LTD")]
    pub long_term_debt: Option<f64>,
    #[serde(rename = "TIE")]
    pub times_interest_earned: Option<f64>,
    #[serde(rename = "Cash Coverage")]
    pub cash_coverage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turnover {
    #[serde(rename = "Total Asset")]
    pub total_asset: Option<f64>,
    #[serde(rename = "NWC")]
    pub nwc: Option<f64>,
    #[serde(rename = "Fixed Asset")]
    pub fixed_asset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profitability {
    #[serde(rename = "Gross Margin")]
    pub gross_margin: Option<f64>,
    #[serde(rename = "Profit Margin")]
    pub profit_margin: Option<f64>,
    #[serde(rename = "ROA")]
    pub roa: Option<f64>,
    #[serde(rename = "ROE")]
    pub roe: Option<f64>,
}

/// ROE split into margin, efficiency and leverage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DupontBreakdown {
    #[serde(rename = "Profitability_Lever")]
    pub profitability_lever: Option<f64>,
    #[serde(rename = "Efficiency_Lever")]
    pub efficiency_lever: Option<f64>,
    #[serde(rename = "Leverage_Lever")]
    pub leverage_lever: Option<f64>,
    #[serde(rename = "Calculated_ROE")]
    pub calculated_roe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRatios {
    #[serde(rename = "P/E")]
    pub price_earnings: Option<f64>,
    #[serde(rename = "Market/Book")]
    pub market_to_book: Option<f64>,
    #[serde(rename = "Price/Sales")]
    pub price_sales: Option<f64>,
    #[serde(rename = "EV")]
    pub enterprise_value: f64,
    #[serde(rename = "EV_EBITDA")]
    pub ev_ebitda: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operational {
    #[serde(rename = "Inv_Turnover")]
    pub inventory_turnover: Option<f64>,
    #[serde(rename = "DSI")]
    pub days_sales_inventory: Option<f64>,
    #[serde(rename = "Rec_Turnover")]
    pub receivables_turnover: Option<f64>,
    #[serde(rename = "DSO")]
    pub days_sales_outstanding: Option<f64>,
}

/// Every financial ratio derived from one [`FinancialInputs`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    #[serde(rename = "Liquidity")]
    pub liquidity: Liquidity,
    #[serde(rename = "Solvency")]
    pub solvency: Solvency,
    #[serde(rename = "Turnover")]
    pub turnover: Turnover,
    #[serde(rename = "Profitability")]
    pub profitability: Profitability,
    #[serde(rename = "DuPont_Breakdown")]
    pub dupont: DupontBreakdown,
    #[serde(rename = "Market")]
    pub market: MarketRatios,
    #[serde(rename = "Operational")]
    pub operational: Operational,
}

impl FinancialMetrics {
    /// Evaluate all financial formulas
    ///
    /// Never fails: a ratio whose denominator is zero is reported as `None`.
    pub fn compute(inputs: &FinancialInputs) -> Self {
        let ca = f::current_assets(
            inputs.cash_equivalents,
            inputs.accounts_receivable,
            inputs.inventory,
        );
        let ta = f::total_assets(ca, inputs.fixed_assets_ppe, inputs.intangible_assets);
        let cl = f::current_liabilities(inputs.accounts_payable, inputs.accrued_expenses);
        let nwc = f::net_working_capital(ca, cl);
        let equity = inputs.shareholders_equity;

        let profit_margin = f::profit_margin(inputs.net_income, inputs.revenue);
        let asset_turnover = f::total_asset_turnover(inputs.revenue, ta);
        let multiplier = f::equity_multiplier(ta, equity);
        let calculated_roe = match (profit_margin, asset_turnover, multiplier) {
            (Ok(m), Ok(t), Ok(l)) => f::dupont_roe(m, t, l),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => Err(e),
        };

        let market_cap = f::market_cap(inputs.stock_price, inputs.shares_outstanding);
        let ev = f::enterprise_value(market_cap, inputs.long_term_debt, inputs.cash_equivalents);

        let inv_turnover = f::inventory_turnover(inputs.cogs, inputs.inventory);
        let rec_turnover = f::receivables_turnover(inputs.revenue, inputs.accounts_receivable);

        Self {
            liquidity: Liquidity {
                current: present(f::current_ratio(ca, cl), 2),
                quick: present(f::quick_ratio(ca, inputs.inventory, cl), 2),
                cash: present(f::cash_ratio(inputs.cash_equivalents, cl), 2),
                interval: present(f::interval_measure(ca, inputs.cogs), 2),
            },
            solvency: Solvency {
                debt_ratio: present(f::total_debt_ratio(ta, equity), 2),
                multiplier: present(multiplier, 2),
                long_term_debt: present(f::long_term_debt_ratio(inputs.long_term_debt, equity), 2),
                times_interest_earned: present(
                    f::times_interest_earned(inputs.ebit, inputs.interest_expense),
                    2,
                ),
                cash_coverage: present(f::cash_coverage(inputs.ebitda, inputs.interest_expense), 2),
            },
            turnover: Turnover {
                total_asset: present(asset_turnover, 2),
                nwc: present(f::nwc_turnover(inputs.revenue, nwc), 2),
                fixed_asset: present(f::fixed_asset_turnover(inputs.revenue, inputs.fixed_assets_ppe), 2),
            },
            profitability: Profitability {
                gross_margin: present(f::gross_margin(inputs.gross_profit, inputs.revenue), 4),
                profit_margin: present(profit_margin, 4),
                roa: present(f::return_on_assets(inputs.net_income, ta), 4),
                roe: present(f::return_on_equity(inputs.net_income, equity), 4),
            },
            dupont: DupontBreakdown {
                profitability_lever: present(profit_margin, 4),
                efficiency_lever: present(asset_turnover, 2),
                leverage_lever: present(multiplier, 2),
                calculated_roe: present(calculated_roe, 4),
            },
            market: MarketRatios {
                price_earnings: present(
                    f::price_to_earnings(inputs.stock_price, inputs.net_income, inputs.shares_outstanding),
                    2,
                ),
                market_to_book: present(f::market_to_book(market_cap, equity), 2),
                price_sales: present(f::price_to_sales(market_cap, inputs.revenue), 4),
                enterprise_value: f::round_to(ev, 2),
                ev_ebitda: present(f::ev_to_ebitda(ev, inputs.ebitda), 2),
            },
            operational: Operational {
                inventory_turnover: present(inv_turnover, 2),
                days_sales_inventory: present(inv_turnover.and_then(f::days_sales_in_inventory), 2),
                receivables_turnover: present(rec_turnover, 2),
                days_sales_outstanding: present(rec_turnover.and_then(f::days_sales_outstanding), 2),
            },
        }
    }
}
