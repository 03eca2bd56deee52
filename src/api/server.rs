//! Dashboard API server implementation
//!
//! HTTP surface over the shared `Dashboard`: chart data, filtered datasets,
//! xlsx download, workbook upload and manual refresh. A background task
//! clears the cache every refresh interval.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::watch;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// API Server configuration
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Dashboard YAML; built-in layout when absent
    pub config_path: Option<PathBuf>,
    /// Invalidate a workbook as soon as its file changes
    pub watch: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            config_path: None,
            watch: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            dashboard,
        }
    }
}

/// Build the router over `state`
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Chart endpoints
        .route("/api/graficos-data", get(handlers::graficos_data))
        .route("/api/haccp-graficos", get(handlers::haccp_graficos))
        // Dataset endpoints
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/:kind", get(handlers::dataset))
        .route("/download/:kind", get(handlers::download))
        .route(
            "/upload/:kind",
            post(handlers::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // State and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Clear the cache every `period`; a failed tick is logged and skipped
pub fn spawn_refresh_task(dashboard: Arc<Dashboard>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let dashboard = Arc::clone(&dashboard);
            match tokio::task::spawn_blocking(move || dashboard.refresh()).await {
                Ok(removed) => info!(removed, "Refresh tick"),
                Err(e) => warn!(error = %e, "Refresh tick failed"),
            }
        }
    })
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcdagua_dash=info,tower_http=info".into()),
        )
        .init();

    let dashboard_config = DashboardConfig::load(config.config_path.as_deref())?;
    let refresh_period = dashboard_config.refresh_interval();
    let dashboard = Arc::new(Dashboard::new(dashboard_config)?);

    let _watcher = if config.watch {
        Some(watch::spawn(Arc::clone(&dashboard))?)
    } else {
        None
    };
    let refresh = spawn_refresh_task(Arc::clone(&dashboard), refresh_period);

    let app = router(Arc::new(AppState::new(dashboard)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("📊 Dashboard API Server starting on http://{}", addr);
    info!("   Charts: /api/graficos-data, /api/haccp-graficos");
    info!("   Datasets: /api/:kind, /download/:kind, /upload/:kind");
    info!(
        "   Refresh every {}s, watch: {}",
        refresh_period.as_secs(),
        config.watch
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh.abort();
    info!("Dashboard API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
