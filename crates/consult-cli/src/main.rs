//! `consult`: AI business consultant on the command line
//!
//! ```bash
//! # Ratios only, no provider needed
//! consult metrics --sample
//!
//! # CFO, CMO and CEO reports for your own figures
//! consult sample --format toml > figures.toml
//! GEMINI_API_KEY=... consult analyze --input figures.toml
//!
//! # Web UI
//! consult serve --bind 0.0.0.0:8080
//! ```

mod cli;
mod input;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command, MetricsArgs, MetricsFormat, ReportFormat};
use consult_analysis::{Consultant, FinancialMetrics, MarketingMetrics};
use consult_utils::{AppConfig, LogFormat};
use consult_web::AppState;
use serde_json::json;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = consult_utils::load_dotenv();
    let cli = Cli::parse();

    let directive = cli
        .log_level
        .clone()
        .unwrap_or_else(|| cli.command.default_log_level().to_string());
    consult_utils::init_tracing(&directive, LogFormat::from_env());
    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Command::Serve { bind } => serve(bind).await,
        Command::Analyze(args) => analyze(args).await,
        Command::Metrics(args) => metrics(&args),
        Command::Sample { format } => {
            println!("{}", input::sample_document(format)?);
            Ok(())
        }
    }
}

async fn serve(bind: Option<String>) -> Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(bind) = bind {
        config = config.with_bind_address(bind);
    }
    let bind = config.bind_address.clone();

    let state = AppState::from_env(config)?;
    let settings = state.default_settings();
    if !settings.is_configured() {
        warn!(
            provider = %settings.kind,
            "No API key configured; enter one in the sidebar before running an analysis"
        );
    }

    consult_web::serve(state, &bind, shutdown_signal()).await?;
    Ok(())
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let inputs = input::load_inputs(&args.input)?;
    let settings = args.provider.resolve(consult_utils::env_var)?;
    let consultant = Consultant::from_settings(&settings)?;

    info!(
        kind = %args.kind,
        provider = %settings.kind,
        model = settings.model(),
        "Running analysis"
    );
    let report = consultant.run(args.kind, &inputs).await?;

    let rendered = match args.format {
        ReportFormat::Markdown => report.to_markdown(),
        ReportFormat::Json => serde_json::to_string_pretty(&report)?,
    };
    output::emit(args.output.as_deref(), &rendered)
}

fn metrics(args: &MetricsArgs) -> Result<()> {
    let inputs = input::load_inputs(&args.input)?;
    let financial = FinancialMetrics::compute(&inputs.financial);
    let marketing = MarketingMetrics::compute(inputs.revenue(), &inputs.marketing);

    match args.format {
        MetricsFormat::Table => {
            println!("Financial Metrics\n{}", output::metrics_table(&financial)?);
            println!("\nMarketing Metrics\n{}", output::metrics_table(&marketing)?);
        }
        MetricsFormat::Json => {
            let body = json!({ "financial": financial, "marketing": marketing });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
