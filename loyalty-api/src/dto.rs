//! Data Transfer Objects
//!
//! Request and response DTOs for the loyalty API layer. Configuration
//! snapshots (rates, tiers, commission schedules) may be supplied per
//! request by the admin-settings collaborator; absent snapshots fall
//! back to the compiled defaults.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loyalty_core::{
    CoachId, CommissionBreakdown, CommissionConfig, CustomerId, OrderId, OrderSnapshot,
    PointsTransaction, RateConfig, TierConfig,
};
use loyalty_engine::{AllocationOutcome, MigrationProgress, RefundOutcome};

// ============================================
// Health & Stats DTOs
// ============================================

/// Service health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Service statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub ledger_rows: u64,
    pub customers: usize,
    pub requests_served: u64,
    pub migration_phase: String,
}

// ============================================
// Ledger DTOs
// ============================================

/// One ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryDto {
    pub id: u64,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub transaction_type: String,
    pub points_amount: i64,
    pub description: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

impl From<PointsTransaction> for LedgerEntryDto {
    fn from(row: PointsTransaction) -> Self {
        Self {
            id: row.id.value(),
            customer_id: row.customer_id.to_string(),
            order_id: row.order_id.map(|id| id.to_string()),
            transaction_type: row.transaction_type.as_str().to_string(),
            points_amount: row.points_amount,
            description: row.description,
            metadata: row.metadata,
            balance_after: row.balance_after,
            created_at: row.created_at,
        }
    }
}

/// Balance query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub customer_id: String,
    pub balance: i64,
}

/// Full ledger for one customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerResponse {
    pub customer_id: String,
    pub transactions: Vec<LedgerEntryDto>,
}

/// Manual ledger entry (admin adjustment, referral bonus)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Must be one of the whitelisted transaction types
    pub transaction_type: String,
    pub points_amount: i64,
    pub description: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

// ============================================
// Redemption DTOs
// ============================================

/// Max-redeemable query string
#[derive(Debug, Clone, Deserialize)]
pub struct MaxRedeemableQuery {
    pub cart_total: Decimal,
}

/// Max-redeemable response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxRedeemableResponse {
    pub customer_id: String,
    pub cart_total: Decimal,
    pub max_redeemable: i64,
}

/// Redemption validation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRedemptionRequest {
    pub customer_id: String,
    pub requested_points: i64,
    pub cart_total: Decimal,
}

/// Redemption validation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRedemptionResponse {
    pub allowed: bool,
    pub max_redeemable: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Apply a staged redemption at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRedemptionRequest {
    pub order_id: String,
    pub customer_id: String,
    /// The staged "points to redeem" value from the checkout session
    pub points: i64,
    pub cart_total: Decimal,
}

/// What the checkout records on the order after redemption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRedemptionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<u64>,
    pub points_redeemed: i64,
    pub discount_amount: Decimal,
    pub order_total_after: Decimal,
    pub balance_after: i64,
}

// ============================================
// Allocation & Refund DTOs
// ============================================

/// Order-completion allocation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateRequest {
    pub order: OrderSnapshot,
    #[serde(default)]
    pub customer_roles: Vec<String>,
    /// Rate snapshot; defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<RateConfig>,
}

/// Allocation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<i64>,
}

impl From<AllocationOutcome> for AllocationResponse {
    fn from(outcome: AllocationOutcome) -> Self {
        match outcome {
            AllocationOutcome::Credited(row) => Self {
                outcome: "credited".to_string(),
                transaction_id: Some(row.id.value()),
                points: Some(row.points_amount),
                balance_after: Some(row.balance_after),
            },
            AllocationOutcome::AlreadyAllocated { transaction_id } => Self {
                outcome: "already_allocated".to_string(),
                transaction_id: Some(transaction_id.value()),
                points: None,
                balance_after: None,
            },
            AllocationOutcome::NotEligible { status } => Self {
                outcome: format!("not_eligible:{status}"),
                transaction_id: None,
                points: None,
                balance_after: None,
            },
            AllocationOutcome::NothingToCredit => Self {
                outcome: "nothing_to_credit".to_string(),
                transaction_id: None,
                points: None,
                balance_after: None,
            },
        }
    }
}

/// Refund deduction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Monetary amount refunded; absent means a full refund
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Decimal>,
}

/// Refund outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResponse {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_debited: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<i64>,
}

impl From<RefundOutcome> for RefundResponse {
    fn from(outcome: RefundOutcome) -> Self {
        match outcome {
            RefundOutcome::Debited(row) => Self {
                outcome: "debited".to_string(),
                transaction_id: Some(row.id.value()),
                points_debited: Some(-row.points_amount),
                balance_after: Some(row.balance_after),
            },
            RefundOutcome::AlreadyRefunded { transaction_id } => Self {
                outcome: "already_refunded".to_string(),
                transaction_id: Some(transaction_id.value()),
                points_debited: None,
                balance_after: None,
            },
            RefundOutcome::NoAllocation => Self {
                outcome: "no_allocation".to_string(),
                transaction_id: None,
                points_debited: None,
                balance_after: None,
            },
            RefundOutcome::NothingToDebit => Self {
                outcome: "nothing_to_debit".to_string(),
                transaction_id: None,
                points_debited: None,
                balance_after: None,
            },
        }
    }
}

// ============================================
// Commission DTOs
// ============================================

/// Commission preview for a referred order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionPreviewRequest {
    pub order: OrderSnapshot,
    pub coach_id: CoachId,
    pub customer_id: CustomerId,
    /// 1-based purchase count with this referrer, counting this order
    pub purchase_count: u32,
    /// The coach's current personal referral count
    pub coach_referral_count: u32,
    /// 1-based season ordinal with this referrer
    pub seasons_with_referrer: u32,
    /// Commission snapshot; defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CommissionConfig>,
    /// Tier snapshot; defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<TierConfig>,
}

/// Commission preview response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionPreviewResponse {
    pub coach_tier: String,
    pub breakdown: CommissionBreakdown,
}

// ============================================
// Migration DTOs
// ============================================

/// Start a ratio migration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStartRequest {
    pub old_rate: i64,
    pub new_rate: i64,
}

/// Migration completion summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStartResponse {
    pub rows_recomputed: usize,
    pub customers_verified: usize,
    pub ratio_version: u32,
    pub progress: MigrationProgress,
}

/// Helpers for id parsing
pub fn parse_customer_id(raw: &str) -> CustomerId {
    CustomerId::new(raw)
}

pub fn parse_order_id(raw: &str) -> OrderId {
    OrderId::new(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_response_from_outcome() {
        let response = AllocationResponse::from(AllocationOutcome::NothingToCredit);
        assert_eq!(response.outcome, "nothing_to_credit");
        assert!(response.transaction_id.is_none());
    }

    #[test]
    fn test_apply_redemption_request_deserializes() {
        let body = serde_json::json!({
            "order_id": "order:1",
            "customer_id": "customer:1",
            "points": 25,
            "cart_total": "99.50"
        });
        let request: ApplyRedemptionRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.points, 25);
        assert_eq!(request.cart_total, Decimal::new(9950, 2));
    }

    #[test]
    fn test_allocate_request_defaults_roles_and_rates() {
        let body = serde_json::json!({
            "order": {
                "order_id": "order:1",
                "customer_id": "customer:1",
                "total": "100",
                "tax_total": "0",
                "currency": "CHF",
                "status": "completed",
                "placed_at": "2025-08-01T10:00:00Z"
            }
        });
        let request: AllocateRequest = serde_json::from_value(body).unwrap();
        assert!(request.customer_roles.is_empty());
        assert!(request.rates.is_none());
    }
}
