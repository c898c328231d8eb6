//! Ledger Repository Trait
//!
//! The append-only points ledger behind every balance. Normal operation
//! only ever appends; `restore` and `rewrite` exist solely for the
//! migration coordinator's backup/rollback-guarded batch path.

use std::collections::HashMap;

use async_trait::async_trait;

use loyalty_core::{CustomerId, OrderId, PointsTransaction, TransactionType};

use crate::error::StoreResult;

/// Draft of a ledger row; the store assigns id and timestamp on append
#[derive(Clone, Debug)]
pub struct LedgerAppend {
    /// Balance owner
    pub customer_id: CustomerId,
    /// Originating order, if any
    pub order_id: Option<OrderId>,
    /// Transaction type
    pub transaction_type: TransactionType,
    /// Signed points delta
    pub points_amount: i64,
    /// Audit text
    pub description: String,
    /// Write-once context
    pub metadata: HashMap<String, serde_json::Value>,
    /// Balance snapshot after this row, computed by the caller under the
    /// customer's lock
    pub balance_after: i64,
}

/// A cached balance that disagrees with its ledger sum
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceMismatch {
    pub customer_id: CustomerId,
    /// Sum of the customer's ledger rows
    pub ledger_sum: i64,
    /// Stored balance snapshot
    pub stored_balance: i64,
}

/// Points ledger repository
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Append one transaction; assigns the next monotonic id
    async fn append(&self, draft: LedgerAppend) -> StoreResult<PointsTransaction>;

    /// Current balance for a customer (0 for unknown customers)
    async fn balance(&self, customer_id: &CustomerId) -> StoreResult<i64>;

    /// All transactions for a customer, in insertion order
    async fn transactions_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> StoreResult<Vec<PointsTransaction>>;

    /// First transaction of the given type tagged with the order id
    async fn find_order_transaction(
        &self,
        order_id: &OrderId,
        transaction_type: TransactionType,
    ) -> StoreResult<Option<PointsTransaction>>;

    /// Every customer with at least one ledger row
    async fn customers(&self) -> StoreResult<Vec<CustomerId>>;

    /// Full copy of the ledger in insertion order (migration backup)
    async fn snapshot(&self) -> StoreResult<Vec<PointsTransaction>>;

    /// Replace the entire ledger wholesale (migration rollback); rebuilds
    /// balances and the id sequence from the restored rows
    async fn restore(&self, rows: Vec<PointsTransaction>) -> StoreResult<()>;

    /// Rewrite existing rows in place by id (migration batches only).
    /// Fails if any row id is unknown; refreshes affected balances.
    async fn rewrite(&self, rows: Vec<PointsTransaction>) -> StoreResult<usize>;

    /// Total number of ledger rows
    async fn count(&self) -> StoreResult<u64>;

    /// Compare every cached balance against its ledger sum
    async fn verify_balances(&self) -> StoreResult<Vec<BalanceMismatch>>;
}
