use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use carbuy_core::report::StandardReportFormatter;
use carbuy_engine::{AnalysisFactory, AnalysisVariant, EngineFactory, JobExecutor, JobRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carbuy_api::background::registry_reaper;
use carbuy_api::config::ServerConfig;
use carbuy_api::router::build_app_router;
use carbuy_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "carbuy_api=debug,carbuy_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    match config.engine.check_environment() {
        Ok(status) => tracing::info!(status, "Analysis environment ready"),
        Err(msg) => tracing::warn!(
            error = %msg,
            "Analysis environment incomplete; submissions will be rejected"
        ),
    }
    // --- Job engine ---
    let registry = Arc::new(JobRegistry::new());
    let factory: Arc<dyn AnalysisFactory> = Arc::new(EngineFactory::new(config.engine.clone()));
    let executor = JobExecutor::new(
        Arc::clone(&registry),
        factory,
        Arc::new(StandardReportFormatter),
        config.engine.analysis_timeout(),
    );
    if executor.variant() != AnalysisVariant::Full {
        tracing::warn!(
            variant = %executor.variant(),
            "SERPER_API_KEY or BRAVE_API_KEY not set; web search will be limited"
        );
    }

    // --- Registry reaper ---
    let reaper_cancel = tokio_util::sync::CancellationToken::new();
    let reaper_handle = tokio::spawn(registry_reaper::run(
        Arc::clone(&registry),
        config.retention_policy(),
        config.reap_interval(),
        reaper_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        executor,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    reaper_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        reaper_handle,
    )
    .await;
    tracing::info!("Registry reaper stopped");

    // In-flight analyses are not resumable; their records die with the process.
    let in_flight = registry.len().await;
    tracing::info!(records = in_flight, "Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
