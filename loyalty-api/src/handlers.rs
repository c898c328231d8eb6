//! API Handlers
//!
//! HTTP handler implementations for the loyalty API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use loyalty_core::{CommissionCalculator, CommissionInput, RateConfig, TransactionType};
use loyalty_engine::{
    PendingRedemption, RatioChange, RedemptionRequest, TransactionRequest,
};

use crate::dto::*;
use crate::error::ApiResult;
use crate::state::AppState;

/// Health check handler
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.config.version.clone(),
        uptime_secs: state.uptime_secs(),
    }))
}

/// Service statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatsResponse>> {
    let ledger = state.engine.ledger();
    let ledger_rows = ledger.count().await.map_err(loyalty_engine::EngineError::from)?;
    let customers = ledger
        .customers()
        .await
        .map_err(loyalty_engine::EngineError::from)?
        .len();
    let migration = state.migration.progress().await;

    Ok(Json(StatsResponse {
        ledger_rows,
        customers,
        requests_served: state.requests_served(),
        migration_phase: migration.phase.as_str().to_string(),
    }))
}

/// Current balance for a customer
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<BalanceResponse>> {
    let customer = parse_customer_id(&customer_id);
    let balance = state.engine.balance(&customer).await?;
    Ok(Json(BalanceResponse {
        customer_id,
        balance,
    }))
}

/// Full ledger for a customer
pub async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<LedgerResponse>> {
    let customer = parse_customer_id(&customer_id);
    let transactions = state.engine.transactions(&customer).await?;
    Ok(Json(LedgerResponse {
        customer_id,
        transactions: transactions.into_iter().map(LedgerEntryDto::from).collect(),
    }))
}

/// Maximum redeemable points for a cart
pub async fn get_max_redeemable(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    Query(query): Query<MaxRedeemableQuery>,
) -> ApiResult<Json<MaxRedeemableResponse>> {
    let customer = parse_customer_id(&customer_id);
    let max_redeemable = state
        .engine
        .max_redeemable(&customer, query.cart_total)
        .await?;
    Ok(Json(MaxRedeemableResponse {
        customer_id,
        cart_total: query.cart_total,
        max_redeemable,
    }))
}

/// Validate a redemption without applying it
pub async fn validate_redemption(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRedemptionRequest>,
) -> ApiResult<Json<ValidateRedemptionResponse>> {
    let customer = parse_customer_id(&request.customer_id);
    let balance = state.engine.balance(&customer).await?;
    let max_redeemable =
        loyalty_core::points::redemption::max_redeemable(balance, request.cart_total);

    match loyalty_core::points::redemption::validate(
        request.requested_points,
        balance,
        request.cart_total,
    ) {
        Ok(()) => Ok(Json(ValidateRedemptionResponse {
            allowed: true,
            max_redeemable,
            reason: None,
        })),
        Err(err) => Ok(Json(ValidateRedemptionResponse {
            allowed: false,
            max_redeemable,
            reason: Some(err.to_string()),
        })),
    }
}

/// Apply a staged redemption
pub async fn apply_redemption(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApplyRedemptionRequest>,
) -> ApiResult<Json<ApplyRedemptionResponse>> {
    let outcome = state
        .engine
        .process_redemption(RedemptionRequest {
            order_id: parse_order_id(&request.order_id),
            customer_id: parse_customer_id(&request.customer_id),
            pending: PendingRedemption {
                points: request.points,
            },
            cart_total: request.cart_total,
        })
        .await?;

    Ok(Json(ApplyRedemptionResponse {
        transaction_id: outcome.transaction.map(|row| row.id.value()),
        points_redeemed: outcome.points_redeemed,
        discount_amount: outcome.discount_amount,
        order_total_after: outcome.order_total_after,
        balance_after: outcome.balance_after,
    }))
}

/// Allocate points for a completed order
pub async fn allocate_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AllocateRequest>,
) -> ApiResult<Json<AllocationResponse>> {
    let rates = request.rates.unwrap_or_else(RateConfig::default);
    let outcome = state
        .engine
        .allocate_for_order(&request.order, &request.customer_roles, &rates)
        .await?;
    Ok(Json(AllocationResponse::from(outcome)))
}

/// Deduct points for a refunded order
pub async fn refund_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Json(request): Json<RefundRequest>,
) -> ApiResult<Json<RefundResponse>> {
    let outcome = state
        .engine
        .refund_for_order(&parse_order_id(&order_id), request.refund_amount)
        .await?;
    Ok(Json(RefundResponse::from(outcome)))
}

/// Append a manual ledger entry
pub async fn add_transaction(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustmentRequest>,
) -> ApiResult<Json<LedgerEntryDto>> {
    // Surface InvalidTransactionType before touching the ledger
    let transaction_type = TransactionType::parse(&request.transaction_type)
        .map_err(loyalty_engine::EngineError::from)?;

    let row = state
        .engine
        .add_transaction(TransactionRequest {
            customer_id: parse_customer_id(&request.customer_id),
            order_id: request.order_id.as_deref().map(parse_order_id),
            transaction_type,
            points_amount: request.points_amount,
            description: request.description,
            metadata: request.metadata,
        })
        .await?;
    Ok(Json(LedgerEntryDto::from(row)))
}

/// Preview the commission breakdown for a referred order
pub async fn preview_commission(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommissionPreviewRequest>,
) -> ApiResult<Json<CommissionPreviewResponse>> {
    // A per-request snapshot overrides the default calculator
    let calculator = match (request.config, request.tiers) {
        (None, None) => (*state.commission).clone(),
        (config, tiers) => CommissionCalculator::new(
            config.unwrap_or_default(),
            tiers.unwrap_or_default(),
        ),
    };

    let input = CommissionInput {
        order: request.order,
        coach_id: request.coach_id,
        customer_id: request.customer_id,
        purchase_count: request.purchase_count,
        coach_referral_count: request.coach_referral_count,
        seasons_with_referrer: request.seasons_with_referrer,
    };

    let tier = calculator.resolve_tier(input.coach_referral_count);
    let breakdown = calculator
        .calculate_total(&input)
        .map_err(loyalty_engine::EngineError::from)?;

    Ok(Json(CommissionPreviewResponse {
        coach_tier: tier.name().to_string(),
        breakdown,
    }))
}

/// Migration status for the admin screen
pub async fn migration_status(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<loyalty_engine::MigrationProgress>> {
    Ok(Json(state.migration.progress().await))
}

/// Start a ratio migration
pub async fn start_migration(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MigrationStartRequest>,
) -> ApiResult<Json<MigrationStartResponse>> {
    let report = state
        .migration
        .run(RatioChange {
            old_rate: request.old_rate,
            new_rate: request.new_rate,
        })
        .await?;
    let progress = state.migration.progress().await;

    Ok(Json(MigrationStartResponse {
        rows_recomputed: report.rows_recomputed,
        customers_verified: report.customers_verified,
        ratio_version: report.ratio_version,
        progress,
    }))
}

/// Roll the last migration back from its backup
pub async fn rollback_migration(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<loyalty_engine::MigrationProgress>> {
    Ok(Json(state.migration.rollback().await?))
}
