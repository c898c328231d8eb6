//! Loyalty Error Codes Registry
//!
//! Error code format: LOY-{module}-{sequence}
//! - LOY-POINTS: Points calculation errors
//! - LOY-LEDGER: Ledger transaction errors
//! - LOY-REDEEM: Redemption validation errors
//! - LOY-ORDER: Order eligibility errors
//! - LOY-CONFIG: Rate/tier configuration errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Loyalty Result type
pub type LoyaltyResult<T> = Result<T, LoyaltyError>;

/// Loyalty Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoyaltyError {
    // ============================================================
    // Points Errors (LOY-POINTS-*)
    // ============================================================
    /// [LOY-POINTS-001] Points rate must be a positive integer
    #[error("[LOY-POINTS-001] Invalid points rate {rate}: rate must be a positive integer")]
    InvalidRate { rate: i64 },

    /// [LOY-POINTS-002] Points value out of range
    #[error("[LOY-POINTS-002] Invalid points value: {reason}")]
    InvalidPointsValue { reason: String },

    // ============================================================
    // Ledger Errors (LOY-LEDGER-*)
    // ============================================================
    /// [LOY-LEDGER-001] Transaction type not in the whitelist
    #[error("[LOY-LEDGER-001] Invalid transaction type: {value}")]
    InvalidTransactionType { value: String },

    /// [LOY-LEDGER-002] Debit would drive the balance below zero
    #[error(
        "[LOY-LEDGER-002] Negative balance violation for customer {customer_id}: \
         balance {balance} cannot absorb {points_amount}"
    )]
    NegativeBalanceViolation {
        customer_id: String,
        balance: i64,
        points_amount: i64,
    },

    // ============================================================
    // Redemption Errors (LOY-REDEEM-*)
    // ============================================================
    /// [LOY-REDEEM-001] Requested points exceed the current balance
    #[error("[LOY-REDEEM-001] Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    /// [LOY-REDEEM-002] Requested points exceed the cart total
    #[error("[LOY-REDEEM-002] Redemption exceeds cart total: requested {requested}, cart total {cart_total}")]
    ExceedsCartTotal { requested: i64, cart_total: Decimal },

    /// [LOY-REDEEM-003] Requested points are negative
    #[error("[LOY-REDEEM-003] Redemption request must be non-negative, got {requested}")]
    NegativeRedemption { requested: i64 },

    // ============================================================
    // Order Errors (LOY-ORDER-*)
    // ============================================================
    /// [LOY-ORDER-001] Order status does not earn points
    #[error("[LOY-ORDER-001] Order {order_id} in status {status} is not eligible for points")]
    OrderNotEligible { order_id: String, status: String },

    /// [LOY-ORDER-002] Order amounts are inconsistent
    #[error("[LOY-ORDER-002] Invalid order amounts for {order_id}: {reason}")]
    InvalidOrderAmounts { order_id: String, reason: String },

    // ============================================================
    // Configuration Errors (LOY-CONFIG-*)
    // ============================================================
    /// [LOY-CONFIG-001] No rate configured for any of the supplied roles
    #[error("[LOY-CONFIG-001] No points rate configured for roles {roles:?}")]
    NoRateForRoles { roles: Vec<String> },

    /// [LOY-CONFIG-002] Tier table is empty or unordered
    #[error("[LOY-CONFIG-002] Invalid tier configuration: {reason}")]
    InvalidTierConfig { reason: String },
}

impl LoyaltyError {
    /// Stable error code (the bracketed registry code)
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRate { .. } => "LOY-POINTS-001",
            Self::InvalidPointsValue { .. } => "LOY-POINTS-002",
            Self::InvalidTransactionType { .. } => "LOY-LEDGER-001",
            Self::NegativeBalanceViolation { .. } => "LOY-LEDGER-002",
            Self::InsufficientBalance { .. } => "LOY-REDEEM-001",
            Self::ExceedsCartTotal { .. } => "LOY-REDEEM-002",
            Self::NegativeRedemption { .. } => "LOY-REDEEM-003",
            Self::OrderNotEligible { .. } => "LOY-ORDER-001",
            Self::InvalidOrderAmounts { .. } => "LOY-ORDER-002",
            Self::NoRateForRoles { .. } => "LOY-CONFIG-001",
            Self::InvalidTierConfig { .. } => "LOY-CONFIG-002",
        }
    }

    /// Whether this error is a caller-facing validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRate { .. }
                | Self::InvalidPointsValue { .. }
                | Self::InvalidTransactionType { .. }
                | Self::InsufficientBalance { .. }
                | Self::ExceedsCartTotal { .. }
                | Self::NegativeRedemption { .. }
        )
    }
}
