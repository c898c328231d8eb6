//! Points Engine
//!
//! Ledger-mutating operations: allocation on order completion, refunds,
//! staged checkout redemption and manual adjustments. Every mutation
//! runs under the customer's lock and validates before appending, so a
//! failed call leaves the ledger exactly as it was.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use loyalty_core::points::{self, redemption};
use loyalty_core::types::metadata_keys;
use loyalty_core::{
    CustomerId, LoyaltyError, OrderId, OrderSnapshot, OrderStatus, PointsTransaction, RateConfig,
    TransactionId, TransactionType,
};
use loyalty_store::{LedgerAppend, LedgerRepository};

use crate::error::EngineResult;
use crate::locks::CustomerLocks;

/// Manual ledger entry request (admin adjustments, referral bonuses)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub customer_id: CustomerId,
    pub order_id: Option<OrderId>,
    pub transaction_type: TransactionType,
    pub points_amount: i64,
    pub description: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Result of an allocation attempt
#[derive(Clone, Debug, PartialEq)]
pub enum AllocationOutcome {
    /// Points credited
    Credited(PointsTransaction),
    /// The order already has a purchase transaction; benign no-op
    AlreadyAllocated { transaction_id: TransactionId },
    /// Order status does not earn points; benign no-op
    NotEligible { status: OrderStatus },
    /// The order total floors to zero points; nothing written
    NothingToCredit,
}

/// Result of a refund deduction attempt
#[derive(Clone, Debug, PartialEq)]
pub enum RefundOutcome {
    /// Points debited
    Debited(PointsTransaction),
    /// The order already has a refund transaction; benign no-op
    AlreadyRefunded { transaction_id: TransactionId },
    /// The order never had points allocated; benign no-op
    NoAllocation,
    /// The refunded fraction floors to zero points; nothing written
    NothingToDebit,
}

/// The staged "points to redeem" value from the checkout session.
///
/// The session mechanism itself belongs to the checkout collaborator;
/// the engine only sees the staged value with an explicit lifetime: it
/// is consumed on success and discarded on validation failure.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PendingRedemption {
    pub points: i64,
}

/// A redemption to apply at checkout
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub pending: PendingRedemption,
    /// Order total the discount applies against
    pub cart_total: Decimal,
}

/// What the checkout collaborator records on the order after redemption
#[derive(Clone, Debug, PartialEq)]
pub struct RedemptionOutcome {
    /// The ledger row, absent when zero points were staged
    pub transaction: Option<PointsTransaction>,
    pub points_redeemed: i64,
    pub discount_amount: Decimal,
    pub order_total_after: Decimal,
    pub balance_after: i64,
}

/// Points engine over the append-only ledger
pub struct PointsEngine {
    ledger: Arc<dyn LedgerRepository>,
    locks: CustomerLocks,
}

impl PointsEngine {
    pub fn new(ledger: Arc<dyn LedgerRepository>) -> Self {
        Self {
            ledger,
            locks: CustomerLocks::new(),
        }
    }

    /// Shared handle to the underlying ledger
    pub fn ledger(&self) -> Arc<dyn LedgerRepository> {
        self.ledger.clone()
    }

    /// Current balance; always the ledger sum for the customer
    pub async fn balance(&self, customer_id: &CustomerId) -> EngineResult<i64> {
        Ok(self.ledger.balance(customer_id).await?)
    }

    /// The customer's full ledger in insertion order
    pub async fn transactions(
        &self,
        customer_id: &CustomerId,
    ) -> EngineResult<Vec<PointsTransaction>> {
        Ok(self.ledger.transactions_for_customer(customer_id).await?)
    }

    /// Whether `requested` points can be redeemed right now
    pub async fn can_redeem(
        &self,
        customer_id: &CustomerId,
        requested: i64,
        cart_total: Decimal,
    ) -> EngineResult<bool> {
        let balance = self.ledger.balance(customer_id).await?;
        Ok(redemption::can_redeem(requested, balance, cart_total))
    }

    /// `min(balance, cart_total)`; the only two bounds on redemption
    pub async fn max_redeemable(
        &self,
        customer_id: &CustomerId,
        cart_total: Decimal,
    ) -> EngineResult<i64> {
        let balance = self.ledger.balance(customer_id).await?;
        Ok(redemption::max_redeemable(balance, cart_total))
    }

    /// Append one transaction, guarding the balance invariant.
    ///
    /// Fails with `NegativeBalanceViolation` if the resulting balance
    /// would drop below zero; nothing is written on failure.
    pub async fn add_transaction(
        &self,
        request: TransactionRequest,
    ) -> EngineResult<PointsTransaction> {
        let _guard = self.locks.acquire(&request.customer_id).await;

        let balance = self.ledger.balance(&request.customer_id).await?;
        let balance_after = balance + request.points_amount;
        if balance_after < 0 {
            return Err(LoyaltyError::NegativeBalanceViolation {
                customer_id: request.customer_id.to_string(),
                balance,
                points_amount: request.points_amount,
            }
            .into());
        }

        let row = self
            .ledger
            .append(LedgerAppend {
                customer_id: request.customer_id,
                order_id: request.order_id,
                transaction_type: request.transaction_type,
                points_amount: request.points_amount,
                description: request.description,
                metadata: request.metadata,
                balance_after,
            })
            .await?;

        debug!(
            transaction_id = row.id.value(),
            customer_id = %row.customer_id,
            points_amount = row.points_amount,
            balance_after = row.balance_after,
            "ledger transaction appended"
        );
        Ok(row)
    }

    /// Credit points for a completed order.
    ///
    /// Idempotent per order: a second call for the same `order_id` finds
    /// the existing purchase transaction and no-ops. The resolved role
    /// and rate are recorded in metadata so any later recomputation of
    /// the same order applies the same rate.
    pub async fn allocate_for_order(
        &self,
        order: &OrderSnapshot,
        customer_roles: &[String],
        rates: &RateConfig,
    ) -> EngineResult<AllocationOutcome> {
        if !order.status.earns_points() {
            debug!(order_id = %order.order_id, status = %order.status, "order not eligible for points");
            return Ok(AllocationOutcome::NotEligible {
                status: order.status,
            });
        }
        order.validate_amounts()?;

        let _guard = self.locks.acquire(&order.customer_id).await;

        if let Some(existing) = self
            .ledger
            .find_order_transaction(&order.order_id, TransactionType::OrderPurchase)
            .await?
        {
            debug!(order_id = %order.order_id, transaction_id = existing.id.value(), "order already allocated");
            return Ok(AllocationOutcome::AlreadyAllocated {
                transaction_id: existing.id,
            });
        }

        let (resolved_role, rate) = rates.resolve_rate(customer_roles)?;
        let points = points::points_from_amount(order.total, rate)?;
        if points == 0 {
            return Ok(AllocationOutcome::NothingToCredit);
        }

        let balance = self.ledger.balance(&order.customer_id).await?;
        let mut metadata = HashMap::new();
        metadata.insert(
            metadata_keys::ORDER_TOTAL.to_string(),
            serde_json::json!(order.total.to_string()),
        );
        metadata.insert(
            metadata_keys::CURRENCY.to_string(),
            serde_json::json!(order.currency),
        );
        metadata.insert(
            metadata_keys::POINTS_RATE.to_string(),
            serde_json::json!(rate),
        );
        metadata.insert(
            metadata_keys::RESOLVED_ROLE.to_string(),
            serde_json::Value::String(resolved_role.clone()),
        );

        let row = self
            .ledger
            .append(LedgerAppend {
                customer_id: order.customer_id.clone(),
                order_id: Some(order.order_id.clone()),
                transaction_type: TransactionType::OrderPurchase,
                points_amount: points,
                description: format!("Points earned for order {}", order.order_id),
                metadata,
                balance_after: balance + points,
            })
            .await?;

        info!(
            order_id = %order.order_id,
            customer_id = %order.customer_id,
            points,
            rate,
            role = %resolved_role,
            "points allocated"
        );
        Ok(AllocationOutcome::Credited(row))
    }

    /// Debit points for a cancelled/refunded order.
    ///
    /// A full refund debits exactly the points originally credited; a
    /// partial refund of fraction `f` debits `floor(original * f)`. An
    /// order with no allocation, or one already refunded, is a no-op.
    pub async fn refund_for_order(
        &self,
        order_id: &OrderId,
        refund_amount: Option<Decimal>,
    ) -> EngineResult<RefundOutcome> {
        let Some(purchase) = self
            .ledger
            .find_order_transaction(order_id, TransactionType::OrderPurchase)
            .await?
        else {
            debug!(order_id = %order_id, "refund for order without allocation, no-op");
            return Ok(RefundOutcome::NoAllocation);
        };

        let _guard = self.locks.acquire(&purchase.customer_id).await;

        if let Some(existing) = self
            .ledger
            .find_order_transaction(order_id, TransactionType::OrderRefund)
            .await?
        {
            debug!(order_id = %order_id, transaction_id = existing.id.value(), "order already refunded");
            return Ok(RefundOutcome::AlreadyRefunded {
                transaction_id: existing.id,
            });
        }

        let original_points = purchase.points_amount;
        let original_total = purchase.metadata_decimal(metadata_keys::ORDER_TOTAL);

        // Full refunds use the stored original point amount, never a
        // recomputation from the refunded currency amount.
        let debit = match (refund_amount, original_total) {
            (None, _) => original_points,
            (Some(refunded), Some(total)) if refunded >= total => original_points,
            (Some(refunded), Some(total)) if total > Decimal::ZERO => {
                points::proportional_points(original_points, refunded / total)?
            }
            (Some(_), _) => original_points,
        };

        if debit <= 0 {
            return Ok(RefundOutcome::NothingToDebit);
        }

        let balance = self.ledger.balance(&purchase.customer_id).await?;
        let balance_after = balance - debit;
        if balance_after < 0 {
            return Err(LoyaltyError::NegativeBalanceViolation {
                customer_id: purchase.customer_id.to_string(),
                balance,
                points_amount: -debit,
            }
            .into());
        }

        let mut metadata = HashMap::new();
        metadata.insert(
            metadata_keys::ORDER_TOTAL.to_string(),
            serde_json::json!(original_total.unwrap_or(Decimal::ZERO).to_string()),
        );
        if let Some(refunded) = refund_amount {
            metadata.insert(
                metadata_keys::REFUND_AMOUNT.to_string(),
                serde_json::json!(refunded.to_string()),
            );
        }

        let row = self
            .ledger
            .append(LedgerAppend {
                customer_id: purchase.customer_id.clone(),
                order_id: Some(order_id.clone()),
                transaction_type: TransactionType::OrderRefund,
                points_amount: -debit,
                description: format!("Points reversed for refunded order {order_id}"),
                metadata,
                balance_after,
            })
            .await?;

        info!(
            order_id = %order_id,
            customer_id = %row.customer_id,
            debit,
            "points reversed for refund"
        );
        Ok(RefundOutcome::Debited(row))
    }

    /// Apply a staged checkout redemption.
    ///
    /// Re-validates against balance and cart total under the customer's
    /// lock; on failure the staged value is discarded and no transaction
    /// is written. Partial redemption is never permitted.
    pub async fn process_redemption(
        &self,
        request: RedemptionRequest,
    ) -> EngineResult<RedemptionOutcome> {
        let _guard = self.locks.acquire(&request.customer_id).await;

        let balance = self.ledger.balance(&request.customer_id).await?;
        let requested = request.pending.points;
        redemption::validate(requested, balance, request.cart_total)?;

        if requested == 0 {
            return Ok(RedemptionOutcome {
                transaction: None,
                points_redeemed: 0,
                discount_amount: Decimal::ZERO,
                order_total_after: request.cart_total,
                balance_after: balance,
            });
        }

        let discount = points::discount_from_points(requested);
        let balance_after = balance - requested;

        let mut metadata = HashMap::new();
        metadata.insert(
            metadata_keys::DISCOUNT_AMOUNT.to_string(),
            serde_json::json!(discount.to_string()),
        );
        metadata.insert(
            metadata_keys::ORDER_TOTAL.to_string(),
            serde_json::json!(request.cart_total.to_string()),
        );

        let row = self
            .ledger
            .append(LedgerAppend {
                customer_id: request.customer_id.clone(),
                order_id: Some(request.order_id.clone()),
                transaction_type: TransactionType::Redemption,
                points_amount: -requested,
                description: format!("Points redeemed at checkout for order {}", request.order_id),
                metadata,
                balance_after,
            })
            .await?;

        info!(
            order_id = %request.order_id,
            customer_id = %request.customer_id,
            points = requested,
            discount = %discount,
            "points redeemed"
        );
        Ok(RedemptionOutcome {
            transaction: Some(row),
            points_redeemed: requested,
            discount_amount: discount,
            order_total_after: request.cart_total - discount,
            balance_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loyalty_store::MemoryLedgerRepository;
    use std::str::FromStr;

    fn create_test_engine() -> PointsEngine {
        PointsEngine::new(Arc::new(MemoryLedgerRepository::new()))
    }

    fn create_test_order(order_id: &str, customer_id: &str, total: &str) -> OrderSnapshot {
        OrderSnapshot {
            order_id: OrderId::new(order_id),
            customer_id: CustomerId::new(customer_id),
            total: Decimal::from_str(total).unwrap(),
            tax_total: Decimal::ZERO,
            currency: "CHF".to_string(),
            status: OrderStatus::Completed,
            placed_at: Utc::now(),
        }
    }

    async fn allocate(engine: &PointsEngine, order: &OrderSnapshot) -> AllocationOutcome {
        engine
            .allocate_for_order(order, &[], &RateConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_allocation_credits_floor_points() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "95");

        let outcome = allocate(&engine, &order).await;
        let AllocationOutcome::Credited(row) = outcome else {
            panic!("expected credit, got {outcome:?}");
        };
        assert_eq!(row.points_amount, 9);
        assert_eq!(row.balance_after, 9);
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            9
        );
    }

    #[tokio::test]
    async fn test_allocation_is_idempotent_per_order() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "100");

        allocate(&engine, &order).await;
        let second = allocate(&engine, &order).await;
        assert!(matches!(second, AllocationOutcome::AlreadyAllocated { .. }));
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            10
        );
    }

    #[tokio::test]
    async fn test_allocation_skips_ineligible_statuses() {
        let engine = create_test_engine();
        let mut order = create_test_order("order:1", "customer:1", "100");
        order.status = OrderStatus::Cancelled;

        let outcome = allocate(&engine, &order).await;
        assert!(matches!(outcome, AllocationOutcome::NotEligible { .. }));
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_allocation_below_rate_credits_nothing() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "9.99");
        let outcome = allocate(&engine, &order).await;
        assert_eq!(outcome, AllocationOutcome::NothingToCredit);
    }

    #[tokio::test]
    async fn test_allocation_uses_most_generous_role() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "100");
        let roles = vec!["customer".to_string(), "partner".to_string()];

        let outcome = engine
            .allocate_for_order(&order, &roles, &RateConfig::default())
            .await
            .unwrap();
        let AllocationOutcome::Credited(row) = outcome else {
            panic!("expected credit");
        };
        // Partner rate 5: 100 / 5 = 20 points
        assert_eq!(row.points_amount, 20);
        assert_eq!(
            row.metadata[metadata_keys::RESOLVED_ROLE],
            serde_json::json!("partner")
        );
    }

    #[tokio::test]
    async fn test_full_refund_debits_original_points_exactly() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "105");
        allocate(&engine, &order).await; // 10 points

        let outcome = engine
            .refund_for_order(&OrderId::new("order:1"), None)
            .await
            .unwrap();
        let RefundOutcome::Debited(row) = outcome else {
            panic!("expected debit");
        };
        assert_eq!(row.points_amount, -10);
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_partial_refund_is_proportional() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "100");
        allocate(&engine, &order).await; // 10 points

        // Refund 50% of a 100-unit order that earned 10 points: debit 5
        let outcome = engine
            .refund_for_order(&OrderId::new("order:1"), Some(Decimal::from(50)))
            .await
            .unwrap();
        let RefundOutcome::Debited(row) = outcome else {
            panic!("expected debit");
        };
        assert_eq!(row.points_amount, -5);
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn test_refund_without_allocation_is_noop() {
        let engine = create_test_engine();
        let outcome = engine
            .refund_for_order(&OrderId::new("order:ghost"), None)
            .await
            .unwrap();
        assert_eq!(outcome, RefundOutcome::NoAllocation);
    }

    #[tokio::test]
    async fn test_refund_is_idempotent_per_order() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "100");
        allocate(&engine, &order).await;

        engine
            .refund_for_order(&OrderId::new("order:1"), None)
            .await
            .unwrap();
        let second = engine
            .refund_for_order(&OrderId::new("order:1"), None)
            .await
            .unwrap();
        assert!(matches!(second, RefundOutcome::AlreadyRefunded { .. }));
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_redemption_end_to_end() {
        let engine = create_test_engine();
        // Balance 0 -> order of 100 at rate 10 -> balance 10
        let order = create_test_order("order:1", "customer:1", "100");
        allocate(&engine, &order).await;
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            10
        );

        // Redeem 10 on a 100-unit cart: discount 10, total after 90, balance 0
        let outcome = engine
            .process_redemption(RedemptionRequest {
                order_id: OrderId::new("order:2"),
                customer_id: CustomerId::new("customer:1"),
                pending: PendingRedemption { points: 10 },
                cart_total: Decimal::from(100),
            })
            .await
            .unwrap();
        assert_eq!(outcome.points_redeemed, 10);
        assert_eq!(outcome.discount_amount, Decimal::from(10));
        assert_eq!(outcome.order_total_after, Decimal::from(90));
        assert_eq!(outcome.balance_after, 0);
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_failed_redemption_writes_nothing() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "100");
        allocate(&engine, &order).await;

        let err = engine
            .process_redemption(RedemptionRequest {
                order_id: OrderId::new("order:2"),
                customer_id: CustomerId::new("customer:1"),
                pending: PendingRedemption { points: 50 },
                cart_total: Decimal::from(100),
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        // The staged value was discarded; ledger untouched
        let rows = engine
            .transactions(&CustomerId::new("customer:1"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            10
        );
    }

    #[tokio::test]
    async fn test_redemption_bounded_by_cart_not_fixed_ceiling() {
        let engine = create_test_engine();
        let order = create_test_order("order:1", "customer:1", "5000");
        allocate(&engine, &order).await; // 500 points

        assert_eq!(
            engine
                .max_redeemable(&CustomerId::new("customer:1"), Decimal::from(350))
                .await
                .unwrap(),
            350
        );

        // Redeeming all 350 must succeed; there is no 100-point cap
        let outcome = engine
            .process_redemption(RedemptionRequest {
                order_id: OrderId::new("order:2"),
                customer_id: CustomerId::new("customer:1"),
                pending: PendingRedemption { points: 350 },
                cart_total: Decimal::from(350),
            })
            .await
            .unwrap();
        assert_eq!(outcome.points_redeemed, 350);
        assert_eq!(outcome.order_total_after, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_add_transaction_guards_negative_balance() {
        let engine = create_test_engine();
        let err = engine
            .add_transaction(TransactionRequest {
                customer_id: CustomerId::new("customer:1"),
                order_id: None,
                transaction_type: TransactionType::AdminAdjustment,
                points_amount: -5,
                description: "manual correction".to_string(),
                metadata: HashMap::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::Core(LoyaltyError::NegativeBalanceViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_balance_always_equals_ledger_sum() {
        let engine = create_test_engine();
        let customer = CustomerId::new("customer:1");

        allocate(&engine, &create_test_order("order:1", "customer:1", "95")).await;
        allocate(&engine, &create_test_order("order:2", "customer:1", "205")).await;
        engine
            .refund_for_order(&OrderId::new("order:1"), None)
            .await
            .unwrap();

        let rows = engine.transactions(&customer).await.unwrap();
        let sum: i64 = rows.iter().map(|r| r.points_amount).sum();
        assert_eq!(engine.balance(&customer).await.unwrap(), sum);
        assert_eq!(
            loyalty_core::verify_balance_chain(&rows),
            Ok(sum)
        );
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_cannot_both_overdraw() {
        let engine = Arc::new(create_test_engine());
        let order = create_test_order("order:1", "customer:1", "100");
        allocate(&engine, &order).await; // 10 points

        let mut handles = Vec::new();
        for i in 0..2 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .process_redemption(RedemptionRequest {
                        order_id: OrderId::new(format!("order:redeem:{i}")),
                        customer_id: CustomerId::new("customer:1"),
                        pending: PendingRedemption { points: 10 },
                        cart_total: Decimal::from(100),
                    })
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        // Exactly one of the two concurrent full redemptions wins
        assert_eq!(successes, 1);
        assert_eq!(
            engine.balance(&CustomerId::new("customer:1")).await.unwrap(),
            0
        );
    }
}
