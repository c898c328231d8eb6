//! Loyalty API Server
//!
//! Serves the loyalty HTTP API over an in-memory ledger.
//!
//! Configuration via environment:
//! - `LOYALTY_LISTEN_ADDR` (default `0.0.0.0:3000`)
//! - `LOYALTY_ENABLE_CORS` (default `true`)
//! - `LOYALTY_AUTH_ENABLED`, `LOYALTY_API_KEYS`, `LOYALTY_BEARER_TOKENS`
//! - `LOYALTY_METRICS_ENABLED` (default `true`)
//! - `RUST_LOG` filter for tracing output

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use loyalty_api::{
    create_router, metrics, ApiConfig, AppState, AuthConfig, MetricsConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    let metrics_config = MetricsConfig::from_env();

    if let Err(err) = metrics::init_metrics(&metrics_config) {
        tracing::warn!(error = %err, "metrics exporter not installed");
    }

    let state = Arc::new(AppState::new(config, auth_config));
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.config.listen_addr).await?;
    info!(
        addr = %state.config.listen_addr,
        version = %state.config.version,
        "loyalty API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("shutdown signal received");
}
