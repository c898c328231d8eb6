//! Loyalty API - HTTP Interface Layer
//!
//! HTTP surface over the points and commission engines.
//!
//! # Endpoints
//!
//! ## Health & Status
//! - `GET /health` - Service health check
//! - `GET /stats` - Ledger and service statistics
//!
//! ## Balance & Ledger
//! - `GET /customers/:customer_id/balance` - Current balance
//! - `GET /customers/:customer_id/ledger` - Full transaction history
//! - `GET /customers/:customer_id/max-redeemable?cart_total=` - Redemption limit
//!
//! ## Redemption
//! - `POST /redemptions/validate` - Validate without applying
//! - `POST /redemptions/apply` - Apply a staged redemption
//!
//! ## Orders
//! - `POST /orders/allocate` - Credit points for a completed order
//! - `POST /orders/:order_id/refund` - Reverse points on refund
//!
//! ## Adjustments & Commission
//! - `POST /transactions` - Manual ledger entry
//! - `POST /commissions/preview` - Commission breakdown for a referred order
//!
//! ## Migration
//! - `GET /migration/status` - Coordinator progress
//! - `POST /migration/start` - Run a ratio migration
//! - `POST /migration/rollback` - Restore the pre-migration backup
//!
//! # Usage Example
//!
//! ```ignore
//! use loyalty_api::{ApiConfig, AppState, AuthConfig, create_router};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = Arc::new(AppState::new(ApiConfig::from_env(), AuthConfig::from_env()));
//!     let app = create_router(state.clone());
//!
//!     let listener = tokio::net::TcpListener::bind(&state.config.listen_addr)
//!         .await
//!         .unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

// Re-export main types
pub use auth::AuthConfig;
pub use dto::*;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use metrics::MetricsConfig;
pub use routes::{create_router, create_v1_router};
pub use state::{ApiConfig, AppState};
