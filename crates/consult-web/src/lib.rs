//! Browser UI and JSON API for the business consultant
//!
//! Routes:
//!
//! - `GET /` input form with the provider sidebar
//! - `POST /settings` change provider, key or model for this browser session
//! - `POST /analyze` run an analysis from the form and show the report
//! - `GET /report` the session's last report
//! - `POST /api/metrics` computed ratios as JSON
//! - `POST /api/analyze` full report as JSON
//! - `GET /healthz`

pub mod error;
mod handlers;
mod markdown;
mod pages;
pub mod session;
pub mod state;

pub use error::WebError;
pub use session::{Session, SessionStore};
pub use state::{AppState, ProviderFactory};

use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

/// How often idle sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/settings", post(handlers::save_settings))
        .route("/analyze", post(handlers::analyze))
        .route("/report", get(handlers::show_report))
        .route("/api/metrics", post(handlers::api_metrics))
        .route("/api/analyze", post(handlers::api_analyze))
        .route("/healthz", get(handlers::healthz))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve(
    state: AppState,
    bind: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(
        app = %state.config.app_name,
        provider = %state.default_settings().kind,
        model = state.default_settings().model(),
        "Listening on http://{}",
        listener.local_addr()?
    );

    let sweeper = spawn_session_sweeper(state.sessions.clone(), SESSION_SWEEP_INTERVAL);
    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    sweeper.abort();

    info!("Server stopped");
    result
}

/// Periodically drop expired sessions
pub fn spawn_session_sweeper(sessions: SessionStore, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                debug!(removed, remaining = sessions.len(), "Expired sessions dropped");
            }
        }
    })
}
