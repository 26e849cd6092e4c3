//! Business analysis for consult-rs
//!
//! This crate turns a company's financial and marketing figures into
//! metrics and consultant-style narratives:
//!
//! - Input records with validation and form-field parsing ([`inputs`])
//! - One guarded function per ratio ([`formulas`])
//! - Financial ratio report: liquidity, solvency, turnover, profitability,
//!   DuPont, market and operational sections ([`financial`])
//! - Marketing unit economics: CAC, churn, NRR, LTV, payback ([`marketing`])
//! - CFO, CMO and CEO prompt templates ([`prompts`])
//! - The [`Consultant`] that sends each prompt to an LLM provider
//!
//! # Example
//!
//! ```rust,ignore
//! use consult_analysis::{AnalysisKind, BusinessInputs, Consultant};
//! use consult_llm::ProviderSettings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let consultant = Consultant::from_settings(&ProviderSettings::from_env()?)?;
//!     let report = consultant
//!         .run(AnalysisKind::Full, &BusinessInputs::sample())
//!         .await?;
//!     println!("{}", report.to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! Metrics alone need no provider:
//!
//! ```
//! use consult_analysis::{BusinessInputs, FinancialMetrics};
//!
//! let inputs = BusinessInputs::sample();
//! let metrics = FinancialMetrics::compute(&inputs.financial);
//! assert_eq!(metrics.liquidity.current, Some(6.18));
//! ```

pub mod consultant;
pub mod error;
pub mod financial;
pub mod formulas;
pub mod inputs;
pub mod marketing;
pub mod prompts;
pub mod report;

pub use consultant::{Consultant, ConsultantConfig};
pub use error::{AnalysisError, InputError, MetricError, MetricResult, Result};
pub use financial::FinancialMetrics;
pub use inputs::{BusinessInputs, FieldRule, FieldSource, FieldSpec, FinancialInputs, MarketingInputs};
pub use marketing::{MarketingMetrics, UnitEconomicsStatus};
pub use report::{AnalysisKind, AnalysisReport};
