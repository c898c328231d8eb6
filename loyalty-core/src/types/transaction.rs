//! Points Ledger Transaction Types
//!
//! A [`PointsTransaction`] is immutable once written. Corrections are new
//! offsetting transactions; only the migration coordinator may rewrite
//! historical rows, inside its backup/rollback guard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{CustomerId, OrderId, TransactionId};
use crate::error::{LoyaltyError, LoyaltyResult};

/// Well-known metadata keys written alongside transactions
pub mod metadata_keys {
    /// Monetary order total at the time of the transaction
    pub const ORDER_TOTAL: &str = "order_total";
    /// Currency code of the originating order
    pub const CURRENCY: &str = "currency";
    /// Points rate (currency units per point) used for the calculation
    pub const POINTS_RATE: &str = "points_rate";
    /// Role whose rate was applied when earning
    pub const RESOLVED_ROLE: &str = "resolved_role";
    /// Monetary discount granted by a redemption
    pub const DISCOUNT_AMOUNT: &str = "discount_amount";
    /// Monetary amount refunded (partial refunds)
    pub const REFUND_AMOUNT: &str = "refund_amount";
}

/// Transaction type whitelist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Points earned from a completed purchase
    OrderPurchase,
    /// Points clawed back for a refunded order
    OrderRefund,
    /// Points spent as a checkout discount
    Redemption,
    /// Manual correction by an administrator
    AdminAdjustment,
    /// Bonus points granted through the referral program
    ReferralBonus,
}

impl TransactionType {
    /// All whitelisted types
    pub const ALL: [Self; 5] = [
        Self::OrderPurchase,
        Self::OrderRefund,
        Self::Redemption,
        Self::AdminAdjustment,
        Self::ReferralBonus,
    ];

    /// Stable string form (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderPurchase => "order_purchase",
            Self::OrderRefund => "order_refund",
            Self::Redemption => "redemption",
            Self::AdminAdjustment => "admin_adjustment",
            Self::ReferralBonus => "referral_bonus",
        }
    }

    /// Parse from the stable string form
    pub fn parse(value: &str) -> LoyaltyResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| LoyaltyError::InvalidTransactionType {
                value: value.to_string(),
            })
    }

    /// Whether this type always debits points
    pub fn is_debit_type(&self) -> bool {
        matches!(self, Self::OrderRefund | Self::Redemption)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable row of the points ledger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointsTransaction {
    /// Unique id, monotonically increasing in insertion order
    pub id: TransactionId,
    /// Balance owner
    pub customer_id: CustomerId,
    /// Originating order; None for manual adjustments
    pub order_id: Option<OrderId>,
    /// Transaction type (whitelisted)
    pub transaction_type: TransactionType,
    /// Signed points delta: positive = credit, negative = debit
    pub points_amount: i64,
    /// Human-readable audit text
    pub description: String,
    /// Write-once context (order total, currency, rate at time of write)
    pub metadata: HashMap<String, serde_json::Value>,
    /// Balance snapshot immediately after this transaction applied
    pub balance_after: i64,
    /// Creation timestamp, non-decreasing per customer
    pub created_at: DateTime<Utc>,
}

impl PointsTransaction {
    /// Whether this row credits points
    pub fn is_credit(&self) -> bool {
        self.points_amount > 0
    }

    /// Whether this row debits points
    pub fn is_debit(&self) -> bool {
        self.points_amount < 0
    }

    /// Metadata value for a well-known key
    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Decimal metadata value, if present and numeric
    pub fn metadata_decimal(&self, key: &str) -> Option<rust_decimal::Decimal> {
        use std::str::FromStr;
        match self.metadata.get(key)? {
            serde_json::Value::String(s) => rust_decimal::Decimal::from_str(s).ok(),
            serde_json::Value::Number(n) => rust_decimal::Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        }
    }
}

/// Verify the balance chain for one customer's ledger slice.
///
/// Rows must be in insertion order. Returns the offending row id on the
/// first `balance_after` that does not equal the running sum.
pub fn verify_balance_chain(rows: &[PointsTransaction]) -> Result<i64, TransactionId> {
    let mut running = 0i64;
    for row in rows {
        running += row.points_amount;
        if row.balance_after != running {
            return Err(row.id);
        }
    }
    Ok(running)
}
