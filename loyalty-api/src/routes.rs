//! API Routes
//!
//! Route definitions for the loyalty API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers::*;
use crate::metrics::metrics_middleware;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let enable_cors = state.config.enable_cors;
    let auth_enabled = state.auth_config.enabled;

    let mut router = Router::new()
        // Health and status
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        // Balance and ledger
        .route("/customers/:customer_id/balance", get(get_balance))
        .route("/customers/:customer_id/ledger", get(get_ledger))
        .route(
            "/customers/:customer_id/max-redeemable",
            get(get_max_redeemable),
        )
        // Redemption
        .route("/redemptions/validate", post(validate_redemption))
        .route("/redemptions/apply", post(apply_redemption))
        // Allocation and refunds
        .route("/orders/allocate", post(allocate_order))
        .route("/orders/:order_id/refund", post(refund_order))
        // Manual adjustments
        .route("/transactions", post(add_transaction))
        // Commission
        .route("/commissions/preview", post(preview_commission))
        // Migration
        .route("/migration/status", get(migration_status))
        .route("/migration/start", post(start_migration))
        .route("/migration/rollback", post(rollback_migration))
        .with_state(state.clone());

    // Add metrics middleware
    router = router.layer(middleware::from_fn_with_state(
        state.clone(),
        metrics_middleware,
    ));

    // Add authentication middleware (if enabled)
    if auth_enabled {
        router = router.layer(middleware::from_fn_with_state(state, auth_middleware));
    }

    // Add CORS middleware
    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.layer(TraceLayer::new_for_http())
}

/// Create a router with the /api/v1 prefix
pub fn create_v1_router(state: Arc<AppState>) -> Router {
    Router::new().nest("/api/v1", create_router(state))
}
