//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use consult_analysis::AnalysisKind;
use consult_llm::{ProviderKind, ProviderSettings};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "consult", version)]
#[command(about = "AI business consultant: financial and marketing ratios with CFO, CMO and CEO commentary", long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "CONSULT_LOG")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web UI
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8080 (defaults to CONSULT_BIND or 127.0.0.1:8080)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run an analysis and print the report
    Analyze(AnalyzeArgs),
    /// Compute the ratios without calling a provider
    Metrics(MetricsArgs),
    /// Print the demo company figures as a starting input file
    Sample {
        #[arg(short, long, value_enum, default_value_t = DataFormat::Toml)]
        format: DataFormat,
    },
}

impl Command {
    /// Log filter when neither `--log-level` nor RUST_LOG is given
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Command::Serve { .. } => "info",
            _ => "warn",
        }
    }
}

/// Where the business figures come from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// JSON or TOML file with `financial` and `marketing` tables
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Use the demo company figures
    #[arg(long)]
    pub sample: bool,
}

#[derive(Args, Debug)]
pub struct ProviderArgs {
    /// LLM provider (defaults to LLM_PROVIDER or gemini)
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// API key override
    #[arg(long)]
    pub api_key: Option<String>,
}

impl ProviderArgs {
    /// Environment settings with the command-line overrides applied
    ///
    /// Picking a provider other than LLM_PROVIDER drops LLM_MODEL and
    /// LLM_API_BASE, which belong to the configured provider.
    pub fn resolve(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> consult_llm::Result<ProviderSettings> {
        let configured = ProviderSettings::from_lookup(&lookup)?;
        let mut settings = match self.provider {
            Some(kind) if kind != configured.kind => {
                let mut settings = ProviderSettings::for_kind_from_lookup(kind, &lookup)?;
                settings.model = None;
                settings.api_base = match kind {
                    ProviderKind::Ollama => lookup("OLLAMA_HOST"),
                    _ => None,
                };
                settings
            }
            _ => configured,
        };

        if let Some(key) = &self.api_key {
            settings = settings.with_api_key(key.as_str());
        }
        if let Some(model) = &self.model {
            settings = settings.with_model(model.as_str());
        }
        Ok(settings)
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// full, financial or marketing
    #[arg(short, long, default_value = "full")]
    pub kind: AnalysisKind,

    #[arg(short, long, value_enum, default_value_t = ReportFormat::Markdown)]
    pub format: ReportFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args, Debug)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(short, long, value_enum, default_value_t = MetricsFormat::Table)]
    pub format: MetricsFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricsFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataFormat {
    Json,
    Toml,
}
