//! In-Memory Ledger Repository
//!
//! Keeps the full ledger in insertion order behind an async RwLock, with
//! a cached per-customer balance map and an atomic monotonic id
//! sequence. The cache is provably consistent with the ledger sum via
//! [`LedgerRepository::verify_balances`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use loyalty_core::{CustomerId, OrderId, PointsTransaction, TransactionId, TransactionType};

use crate::error::{StoreError, StoreResult};
use crate::repos::ledger_repo::{BalanceMismatch, LedgerAppend, LedgerRepository};

#[derive(Default)]
struct LedgerState {
    /// All rows in insertion order
    rows: Vec<PointsTransaction>,
    /// Cached balance per customer
    balances: HashMap<CustomerId, i64>,
}

impl LedgerState {
    fn rebuild_balances(&mut self) {
        self.balances.clear();
        for row in &self.rows {
            *self.balances.entry(row.customer_id.clone()).or_insert(0) += row.points_amount;
        }
    }
}

/// In-memory [`LedgerRepository`] implementation
pub struct MemoryLedgerRepository {
    state: RwLock<LedgerState>,
    sequence: AtomicU64,
}

impl MemoryLedgerRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> TransactionId {
        TransactionId::new(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl Default for MemoryLedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn append(&self, draft: LedgerAppend) -> StoreResult<PointsTransaction> {
        let mut state = self.state.write().await;

        let row = PointsTransaction {
            id: self.next_id(),
            customer_id: draft.customer_id.clone(),
            order_id: draft.order_id,
            transaction_type: draft.transaction_type,
            points_amount: draft.points_amount,
            description: draft.description,
            metadata: draft.metadata,
            balance_after: draft.balance_after,
            created_at: Utc::now(),
        };

        *state.balances.entry(draft.customer_id).or_insert(0) += row.points_amount;
        state.rows.push(row.clone());
        Ok(row)
    }

    async fn balance(&self, customer_id: &CustomerId) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state.balances.get(customer_id).copied().unwrap_or(0))
    }

    async fn transactions_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> StoreResult<Vec<PointsTransaction>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .filter(|row| &row.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn find_order_transaction(
        &self,
        order_id: &OrderId,
        transaction_type: TransactionType,
    ) -> StoreResult<Option<PointsTransaction>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .find(|row| {
                row.transaction_type == transaction_type
                    && row.order_id.as_ref() == Some(order_id)
            })
            .cloned())
    }

    async fn customers(&self) -> StoreResult<Vec<CustomerId>> {
        let state = self.state.read().await;
        let mut customers: Vec<CustomerId> = state.balances.keys().cloned().collect();
        customers.sort();
        Ok(customers)
    }

    async fn snapshot(&self) -> StoreResult<Vec<PointsTransaction>> {
        let state = self.state.read().await;
        Ok(state.rows.clone())
    }

    async fn restore(&self, rows: Vec<PointsTransaction>) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let max_id = rows.iter().map(|row| row.id.value()).max().unwrap_or(0);
        state.rows = rows;
        state.rebuild_balances();
        self.sequence.store(max_id, Ordering::SeqCst);
        Ok(())
    }

    async fn rewrite(&self, rows: Vec<PointsTransaction>) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let mut rewritten = 0usize;
        for replacement in rows {
            let slot = state
                .rows
                .iter_mut()
                .find(|row| row.id == replacement.id)
                .ok_or_else(|| {
                    StoreError::not_found("PointsTransaction", replacement.id.to_string())
                })?;
            *slot = replacement;
            rewritten += 1;
        }
        state.rebuild_balances();
        Ok(rewritten)
    }

    async fn count(&self) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state.rows.len() as u64)
    }

    async fn verify_balances(&self) -> StoreResult<Vec<BalanceMismatch>> {
        let state = self.state.read().await;
        let mut sums: HashMap<CustomerId, i64> = HashMap::new();
        for row in &state.rows {
            *sums.entry(row.customer_id.clone()).or_insert(0) += row.points_amount;
        }

        let mut mismatches = Vec::new();
        for (customer_id, stored_balance) in &state.balances {
            let ledger_sum = sums.get(customer_id).copied().unwrap_or(0);
            if ledger_sum != *stored_balance {
                mismatches.push(BalanceMismatch {
                    customer_id: customer_id.clone(),
                    ledger_sum,
                    stored_balance: *stored_balance,
                });
            }
        }
        mismatches.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        Ok(mismatches)
    }
}
