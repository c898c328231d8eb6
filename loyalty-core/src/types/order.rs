//! Order Snapshot Types
//!
//! The engines never own orders; the storefront supplies a read-only
//! snapshot of the fields the point and commission math needs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{CustomerId, OrderId};
use crate::error::{LoyaltyError, LoyaltyResult};

/// Order lifecycle status as reported by the storefront
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// Point allocation only triggers on completed/processing, never on
    /// pending/failed/cancelled.
    pub fn earns_points(&self) -> bool {
        matches!(self, Self::Completed | Self::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only snapshot of a storefront order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Order identifier
    pub order_id: OrderId,
    /// Purchasing customer
    pub customer_id: CustomerId,
    /// Gross order total, tax included
    pub total: Decimal,
    /// Tax portion of the total
    pub tax_total: Decimal,
    /// Currency code, carried opaquely into transaction metadata
    pub currency: String,
    /// Lifecycle status at event time
    pub status: OrderStatus,
    /// When the order was placed
    pub placed_at: DateTime<Utc>,
}

impl OrderSnapshot {
    /// Order amount with tax removed; the base for every commission term
    pub fn net_total(&self) -> Decimal {
        self.total - self.tax_total
    }

    /// Validate amount consistency before any calculation
    pub fn validate_amounts(&self) -> LoyaltyResult<()> {
        if self.total < Decimal::ZERO {
            return Err(LoyaltyError::InvalidOrderAmounts {
                order_id: self.order_id.to_string(),
                reason: format!("negative total {}", self.total),
            });
        }
        if self.tax_total < Decimal::ZERO || self.tax_total > self.total {
            return Err(LoyaltyError::InvalidOrderAmounts {
                order_id: self.order_id.to_string(),
                reason: format!("tax {} outside [0, {}]", self.tax_total, self.total),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_order(total: Decimal, tax: Decimal, status: OrderStatus) -> OrderSnapshot {
        OrderSnapshot {
            order_id: OrderId::new("order:1"),
            customer_id: CustomerId::new("customer:1"),
            total,
            tax_total: tax,
            currency: "CHF".to_string(),
            status,
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_completed_and_processing_earn_points() {
        assert!(OrderStatus::Completed.earns_points());
        assert!(OrderStatus::Processing.earns_points());
        assert!(!OrderStatus::Pending.earns_points());
        assert!(!OrderStatus::Cancelled.earns_points());
        assert!(!OrderStatus::Failed.earns_points());
        assert!(!OrderStatus::Refunded.earns_points());
    }

    #[test]
    fn test_net_total_removes_tax() {
        let order = create_test_order(
            Decimal::new(10770, 2),
            Decimal::new(770, 2),
            OrderStatus::Completed,
        );
        assert_eq!(order.net_total(), Decimal::from(100));
    }

    #[test]
    fn test_validate_amounts_rejects_tax_above_total() {
        let order = create_test_order(Decimal::from(50), Decimal::from(60), OrderStatus::Completed);
        let err = order.validate_amounts().unwrap_err();
        assert_eq!(err.code(), "LOY-ORDER-002");
    }
}
