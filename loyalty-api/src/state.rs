//! Application State
//!
//! Shared state for the loyalty API service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use loyalty_core::CommissionCalculator;
use loyalty_engine::{MigrationCoordinator, PointsEngine};
use loyalty_store::MemoryLedgerRepository;

use crate::auth::AuthConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Service name
    pub service_name: String,
    /// Service version
    pub version: String,
    /// Listen address
    pub listen_addr: String,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_name: "loyalty-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            enable_cors: true,
        }
    }
}

impl ApiConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let listen_addr = std::env::var("LOYALTY_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let enable_cors = std::env::var("LOYALTY_ENABLE_CORS")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);

        Self {
            listen_addr,
            enable_cors,
            ..Default::default()
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Configuration
    pub config: ApiConfig,
    /// Authentication configuration
    pub auth_config: AuthConfig,
    /// Points engine over the ledger
    pub engine: Arc<PointsEngine>,
    /// Pure commission calculator
    pub commission: Arc<CommissionCalculator>,
    /// Ratio migration coordinator
    pub migration: Arc<MigrationCoordinator>,
    /// Service start time
    started_at: DateTime<Utc>,
    /// Requests served since start
    requests_served: AtomicU64,
}

impl AppState {
    /// Build state over a fresh in-memory ledger
    pub fn new(config: ApiConfig, auth_config: AuthConfig) -> Self {
        let ledger = Arc::new(MemoryLedgerRepository::new());
        let engine = Arc::new(PointsEngine::new(ledger.clone()));
        let migration = Arc::new(MigrationCoordinator::new(ledger));

        Self {
            config,
            auth_config,
            engine,
            commission: Arc::new(CommissionCalculator::default_config()),
            migration,
            started_at: Utc::now(),
            requests_served: AtomicU64::new(0),
        }
    }

    /// Seconds since service start
    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Count one served request
    pub fn increment_requests(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Requests served since start
    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }
}
