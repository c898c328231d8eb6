//! Prometheus Metrics
//!
//! # Metrics
//!
//! ## Counters
//! - `loyalty_http_requests_total` - HTTP requests by method, path, status
//! - `loyalty_errors_total` - Errors by code
//!
//! ## Histograms
//! - `loyalty_http_request_duration_seconds` - HTTP request duration
//!
//! ## Gauges
//! - `loyalty_uptime_seconds` - Service uptime
//!
//! # Configuration
//!
//! - `LOYALTY_METRICS_ENABLED`: Enable metrics (default: true)

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

/// Metrics configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let enabled = std::env::var("LOYALTY_METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);
        Self { enabled }
    }
}

/// Initialize the Prometheus exporter; call once at startup
pub fn init_metrics(config: &MetricsConfig) -> Result<(), String> {
    if !config.enabled {
        tracing::info!("Metrics disabled");
        return Ok(());
    }

    PrometheusBuilder::new()
        .install()
        .map_err(|e| format!("Failed to install metrics recorder: {e}"))?;

    tracing::info!("Metrics initialized");
    Ok(())
}

/// Record a request metric
pub fn record_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let path = normalize_path(path);

    counter!(
        "loyalty_http_requests_total",
        "method" => method.to_string(),
        "path" => path.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "loyalty_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path,
        "status" => status.to_string()
    )
    .record(duration_secs);
}

/// Record an error by code
pub fn record_error(code: &str) {
    counter!("loyalty_errors_total", "code" => code.to_string()).increment(1);
}

/// Update the uptime gauge
pub fn set_uptime(seconds: u64) {
    gauge!("loyalty_uptime_seconds").set(seconds as f64);
}

/// Normalize a path for metric labels: customer/order ids become
/// placeholders so label cardinality stays bounded
fn normalize_path(path: &str) -> String {
    let normalized: Vec<&str> = path
        .split('/')
        .map(|segment| {
            if segment.contains(':')
                || segment.chars().all(|c| c.is_ascii_digit()) && !segment.is_empty()
            {
                ":id"
            } else {
                segment
            }
        })
        .collect();
    normalized.join("/")
}

/// Axum middleware recording request count and duration
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    state.increment_requests();
    set_uptime(state.uptime_secs());
    record_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_ids() {
        assert_eq!(
            normalize_path("/customers/customer:17/balance"),
            "/customers/:id/balance"
        );
        assert_eq!(normalize_path("/orders/12345/refund"), "/orders/:id/refund");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_config_defaults_enabled() {
        assert!(MetricsConfig::default().enabled);
    }
}
