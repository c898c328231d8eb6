//! Ratio Migration Coordinator
//!
//! Rewrites historical `order_purchase` rows when the points-per-currency
//! ratio changes. The ledger is backed up in full before any row is
//! touched; batches are resumable through a cursor; verification re-sums
//! every customer before the run may complete; rollback restores the
//! backup wholesale.
//!
//! Phases: `not_started -> backing_up -> migrating -> verifying ->
//! completed`, with `rolled_back` reachable from any phase once a backup
//! exists.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use loyalty_core::points;
use loyalty_core::types::metadata_keys;
use loyalty_core::{CustomerId, PointsTransaction, TransactionType};
use loyalty_store::LedgerRepository;

use crate::error::{EngineError, EngineResult};

/// Coordinator phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    NotStarted,
    BackingUp,
    Migrating,
    Verifying,
    Completed,
    RolledBack,
    Failed,
}

impl MigrationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::BackingUp => "backing_up",
            Self::Migrating => "migrating",
            Self::Verifying => "verifying",
            Self::Completed => "completed",
            Self::RolledBack => "rolled_back",
            Self::Failed => "failed",
        }
    }

    /// An active phase blocks a second invocation
    pub fn is_active(&self) -> bool {
        matches!(self, Self::BackingUp | Self::Migrating | Self::Verifying)
    }
}

impl std::fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The ratio change to apply
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RatioChange {
    /// Rate the historical rows were written with
    pub old_rate: i64,
    /// Rate to recompute purchase-derived rows at
    pub new_rate: i64,
}

impl RatioChange {
    pub fn validate(&self) -> EngineResult<()> {
        if self.old_rate <= 0 || self.new_rate <= 0 {
            return Err(EngineError::InvalidRatioChange {
                reason: format!(
                    "rates must be positive, got {} -> {}",
                    self.old_rate, self.new_rate
                ),
            });
        }
        if self.old_rate == self.new_rate {
            return Err(EngineError::InvalidRatioChange {
                reason: format!("old and new rate are both {}", self.old_rate),
            });
        }
        Ok(())
    }
}

/// Coordinator configuration
#[derive(Clone, Debug)]
pub struct MigrationConfig {
    /// Rows rewritten per batch
    pub batch_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Queryable progress for the admin screen
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationProgress {
    pub phase: MigrationPhase,
    pub total_batches: usize,
    pub completed_batches: usize,
    pub rows_recomputed: usize,
    pub ratio_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Final run summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub rows_recomputed: usize,
    pub customers_verified: usize,
    pub ratio_version: u32,
}

struct CoordinatorState {
    phase: MigrationPhase,
    backup: Option<Vec<PointsTransaction>>,
    batches: Vec<Vec<PointsTransaction>>,
    cursor: usize,
    rows_recomputed: usize,
    ratio_version: u32,
    previous_ratio_version: u32,
    last_error: Option<String>,
}

impl CoordinatorState {
    fn new() -> Self {
        Self {
            phase: MigrationPhase::NotStarted,
            backup: None,
            batches: Vec::new(),
            cursor: 0,
            rows_recomputed: 0,
            ratio_version: 1,
            previous_ratio_version: 1,
            last_error: None,
        }
    }
}

/// Single-worker migration coordinator over the ledger
pub struct MigrationCoordinator {
    ledger: Arc<dyn LedgerRepository>,
    config: MigrationConfig,
    state: tokio::sync::Mutex<CoordinatorState>,
}

impl MigrationCoordinator {
    pub fn new(ledger: Arc<dyn LedgerRepository>) -> Self {
        Self::with_config(ledger, MigrationConfig::default())
    }

    pub fn with_config(ledger: Arc<dyn LedgerRepository>, config: MigrationConfig) -> Self {
        Self {
            ledger,
            config,
            state: tokio::sync::Mutex::new(CoordinatorState::new()),
        }
    }

    /// Current progress snapshot
    pub async fn progress(&self) -> MigrationProgress {
        let state = self.state.lock().await;
        MigrationProgress {
            phase: state.phase,
            total_batches: state.batches.len(),
            completed_batches: state.cursor,
            rows_recomputed: state.rows_recomputed,
            ratio_version: state.ratio_version,
            last_error: state.last_error.clone(),
        }
    }

    /// Run a full migration: backup, batched rewrite, verification.
    ///
    /// The first invocation wins; a concurrent second invocation reports
    /// `MigrationAlreadyRunning`.
    pub async fn run(&self, change: RatioChange) -> EngineResult<MigrationReport> {
        self.begin(change).await?;
        while self.process_next_batch().await?.is_some() {}
        self.finish().await
    }

    /// Resume a run interrupted mid-migration: drains the remaining
    /// batches from the cursor and verifies. Already-completed batches
    /// are not reprocessed.
    pub async fn resume(&self) -> EngineResult<MigrationReport> {
        {
            let state = self.state.lock().await;
            if state.phase != MigrationPhase::Migrating {
                return Err(EngineError::InvalidMigrationState {
                    expected: MigrationPhase::Migrating.as_str().to_string(),
                    actual: state.phase.as_str().to_string(),
                });
            }
        }
        while self.process_next_batch().await?.is_some() {}
        self.finish().await
    }

    /// Back up the ledger and stage the recomputed rows.
    ///
    /// Holds the coordinator lock for the whole preparation, so a second
    /// caller observes an active phase and is turned away. If backup
    /// creation fails the migration aborts with no row touched.
    pub async fn begin(&self, change: RatioChange) -> EngineResult<MigrationProgress> {
        change.validate()?;

        let mut state = self.state.lock().await;
        if state.phase.is_active() {
            return Err(EngineError::MigrationAlreadyRunning);
        }

        state.phase = MigrationPhase::BackingUp;
        let backup = match self.ledger.snapshot().await {
            Ok(rows) => rows,
            Err(err) => {
                state.phase = MigrationPhase::Failed;
                state.last_error = Some(err.to_string());
                return Err(EngineError::MigrationBackupFailed {
                    reason: err.to_string(),
                });
            }
        };

        let staged = stage_rows(&backup, change);
        let batches: Vec<Vec<PointsTransaction>> = staged
            .chunks(self.config.batch_size.max(1))
            .map(<[PointsTransaction]>::to_vec)
            .collect();

        info!(
            rows_total = backup.len(),
            rows_staged = staged.len(),
            batches = batches.len(),
            old_rate = change.old_rate,
            new_rate = change.new_rate,
            "migration staged"
        );

        state.backup = Some(backup);
        state.batches = batches;
        state.cursor = 0;
        state.rows_recomputed = 0;
        state.previous_ratio_version = state.ratio_version;
        state.last_error = None;
        state.phase = MigrationPhase::Migrating;

        Ok(MigrationProgress {
            phase: state.phase,
            total_batches: state.batches.len(),
            completed_batches: 0,
            rows_recomputed: 0,
            ratio_version: state.ratio_version,
            last_error: None,
        })
    }

    /// Rewrite the next staged batch; `None` when every batch is done
    pub async fn process_next_batch(&self) -> EngineResult<Option<usize>> {
        let mut state = self.state.lock().await;
        if state.phase != MigrationPhase::Migrating {
            return Err(EngineError::InvalidMigrationState {
                expected: MigrationPhase::Migrating.as_str().to_string(),
                actual: state.phase.as_str().to_string(),
            });
        }
        if state.cursor >= state.batches.len() {
            return Ok(None);
        }

        let batch = state.batches[state.cursor].clone();
        let batch_len = batch.len();
        match self.ledger.rewrite(batch).await {
            Ok(_) => {
                state.cursor += 1;
                state.rows_recomputed += batch_len;
                Ok(Some(state.cursor))
            }
            Err(err) => {
                state.phase = MigrationPhase::Failed;
                state.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Verify every customer's ledger sum against the stored balance
    /// snapshots and complete the run. Any mismatch blocks completion.
    pub async fn finish(&self) -> EngineResult<MigrationReport> {
        let mut state = self.state.lock().await;
        if state.phase != MigrationPhase::Migrating || state.cursor < state.batches.len() {
            return Err(EngineError::InvalidMigrationState {
                expected: "migrating with all batches processed".to_string(),
                actual: state.phase.as_str().to_string(),
            });
        }
        state.phase = MigrationPhase::Verifying;

        let rows = self.ledger.snapshot().await?;
        let mut by_customer: HashMap<CustomerId, Vec<&PointsTransaction>> = HashMap::new();
        for row in &rows {
            by_customer.entry(row.customer_id.clone()).or_default().push(row);
        }

        for (customer_id, rows) in &by_customer {
            let ledger_sum: i64 = rows.iter().map(|r| r.points_amount).sum();
            let chain_end = rows.last().map(|r| r.balance_after).unwrap_or(0);
            let stored_balance = self.ledger.balance(customer_id).await?;

            if ledger_sum != chain_end || ledger_sum != stored_balance {
                state.phase = MigrationPhase::Failed;
                let err = EngineError::MigrationVerificationFailed {
                    customer_id: customer_id.to_string(),
                    ledger_sum,
                    stored_balance: if ledger_sum != chain_end {
                        chain_end
                    } else {
                        stored_balance
                    },
                };
                state.last_error = Some(err.to_string());
                return Err(err);
            }
        }

        state.ratio_version += 1;
        state.phase = MigrationPhase::Completed;
        let report = MigrationReport {
            rows_recomputed: state.rows_recomputed,
            customers_verified: by_customer.len(),
            ratio_version: state.ratio_version,
        };
        info!(
            rows_recomputed = report.rows_recomputed,
            customers_verified = report.customers_verified,
            ratio_version = report.ratio_version,
            "migration completed"
        );
        Ok(report)
    }

    /// Restore every row from the backup wholesale and reset the ratio
    /// version. Fails loudly when no backup exists; never a silent no-op.
    pub async fn rollback(&self) -> EngineResult<MigrationProgress> {
        let mut state = self.state.lock().await;
        let Some(backup) = state.backup.clone() else {
            return Err(EngineError::RollbackUnavailable);
        };

        self.ledger.restore(backup).await?;
        state.ratio_version = state.previous_ratio_version;
        state.phase = MigrationPhase::RolledBack;
        state.batches.clear();
        state.cursor = 0;
        state.rows_recomputed = 0;

        info!(ratio_version = state.ratio_version, "migration rolled back");
        Ok(MigrationProgress {
            phase: state.phase,
            total_batches: 0,
            completed_batches: 0,
            rows_recomputed: 0,
            ratio_version: state.ratio_version,
            last_error: state.last_error.clone(),
        })
    }
}

/// Stage the rewritten rows for a ratio change.
///
/// Only `order_purchase` rows are recomputed, from the order total
/// recorded in their metadata; manually adjusted and bonus-derived rows
/// are left untouched. Every customer's `balance_after` chain is then
/// recomputed; a debit that would overdraw the recomputed balance is
/// clamped so the chain bottoms out at zero (the defined corrective
/// recovery). Returns only the rows that actually changed.
fn stage_rows(backup: &[PointsTransaction], change: RatioChange) -> Vec<PointsTransaction> {
    let mut rows: Vec<PointsTransaction> = backup.to_vec();

    for row in &mut rows {
        if row.transaction_type != TransactionType::OrderPurchase {
            continue;
        }
        let Some(total) = row.metadata_decimal(metadata_keys::ORDER_TOTAL) else {
            warn!(
                transaction_id = row.id.value(),
                "purchase row without order_total metadata left untouched"
            );
            continue;
        };
        // points_from_amount only fails on non-positive rates, which
        // RatioChange::validate has already excluded.
        let Ok(new_points) = points::points_from_amount(total, change.new_rate) else {
            continue;
        };
        if new_points != row.points_amount {
            row.points_amount = new_points;
            row.metadata.insert(
                metadata_keys::POINTS_RATE.to_string(),
                serde_json::json!(change.new_rate),
            );
        }
    }

    // Recompute balance_after chains per customer, in insertion order.
    let mut running: HashMap<CustomerId, i64> = HashMap::new();
    for row in &mut rows {
        let balance = running.entry(row.customer_id.clone()).or_insert(0);
        if *balance + row.points_amount < 0 {
            // Corrective clamp: shrink the debit so the balance bottoms
            // out at zero instead of going negative.
            row.points_amount = -*balance;
        }
        *balance += row.points_amount;
        row.balance_after = *balance;
    }

    rows.into_iter()
        .zip(backup.iter())
        .filter(|(staged, original)| staged != original)
        .map(|(staged, _)| staged)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_core::{OrderId, RateConfig, TransactionType};
    use loyalty_store::MemoryLedgerRepository;
    use rust_decimal::Decimal;
    use std::collections::HashMap as StdHashMap;

    use crate::points_engine::{PointsEngine, TransactionRequest};

    async fn create_test_ledger() -> (Arc<MemoryLedgerRepository>, PointsEngine) {
        let repo = Arc::new(MemoryLedgerRepository::new());
        let engine = PointsEngine::new(repo.clone());
        (repo, engine)
    }

    async fn credit_order(engine: &PointsEngine, order_id: &str, customer: &str, total: i64) {
        let order = loyalty_core::OrderSnapshot {
            order_id: OrderId::new(order_id),
            customer_id: CustomerId::new(customer),
            total: Decimal::from(total),
            tax_total: Decimal::ZERO,
            currency: "CHF".to_string(),
            status: loyalty_core::OrderStatus::Completed,
            placed_at: chrono::Utc::now(),
        };
        engine
            .allocate_for_order(&order, &[], &RateConfig::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_migration_rescales_purchase_rows() {
        let (repo, engine) = create_test_ledger().await;
        credit_order(&engine, "order:1", "customer:1", 100).await; // 10 pts at rate 10
        credit_order(&engine, "order:2", "customer:1", 250).await; // 25 pts

        let coordinator = MigrationCoordinator::new(repo.clone());
        let report = coordinator
            .run(RatioChange {
                old_rate: 10,
                new_rate: 5,
            })
            .await
            .unwrap();

        // Rate 10 -> 5 doubles every purchase-derived balance
        assert_eq!(
            repo.balance(&CustomerId::new("customer:1")).await.unwrap(),
            70
        );
        assert_eq!(report.customers_verified, 1);
        assert_eq!(report.ratio_version, 2);
        assert!(repo.verify_balances().await.unwrap().is_empty());
        assert_eq!(
            coordinator.progress().await.phase,
            MigrationPhase::Completed
        );
    }

    #[tokio::test]
    async fn test_migration_leaves_non_purchase_rows_untouched() {
        let (repo, engine) = create_test_ledger().await;
        credit_order(&engine, "order:1", "customer:1", 100).await; // 10 pts
        engine
            .add_transaction(TransactionRequest {
                customer_id: CustomerId::new("customer:1"),
                order_id: None,
                transaction_type: TransactionType::ReferralBonus,
                points_amount: 7,
                description: "referral bonus".to_string(),
                metadata: StdHashMap::new(),
            })
            .await
            .unwrap();

        let coordinator = MigrationCoordinator::new(repo.clone());
        coordinator
            .run(RatioChange {
                old_rate: 10,
                new_rate: 5,
            })
            .await
            .unwrap();

        let rows = repo
            .transactions_for_customer(&CustomerId::new("customer:1"))
            .await
            .unwrap();
        // Purchase doubled, bonus preserved
        assert_eq!(rows[0].points_amount, 20);
        assert_eq!(rows[1].points_amount, 7);
        assert_eq!(rows[1].balance_after, 27);
    }

    #[tokio::test]
    async fn test_migration_preserves_sums_in_new_ratio_units() {
        let (repo, engine) = create_test_ledger().await;
        credit_order(&engine, "order:1", "customer:1", 100).await;
        credit_order(&engine, "order:2", "customer:2", 300).await;

        let pre_sum_c1 = repo.balance(&CustomerId::new("customer:1")).await.unwrap();
        let pre_sum_c2 = repo.balance(&CustomerId::new("customer:2")).await.unwrap();

        let coordinator = MigrationCoordinator::new(repo.clone());
        coordinator
            .run(RatioChange {
                old_rate: 10,
                new_rate: 5,
            })
            .await
            .unwrap();

        // Old rate is twice the new rate: balances double exactly, no
        // silent point loss or gain.
        assert_eq!(
            repo.balance(&CustomerId::new("customer:1")).await.unwrap(),
            pre_sum_c1 * 2
        );
        assert_eq!(
            repo.balance(&CustomerId::new("customer:2")).await.unwrap(),
            pre_sum_c2 * 2
        );
    }

    #[tokio::test]
    async fn test_migration_is_resumable_from_cursor() {
        let (repo, engine) = create_test_ledger().await;
        for i in 0..5 {
            credit_order(&engine, &format!("order:{i}"), &format!("customer:{i}"), 100).await;
        }

        let coordinator = MigrationCoordinator::with_config(
            repo.clone(),
            MigrationConfig { batch_size: 2 },
        );
        coordinator
            .begin(RatioChange {
                old_rate: 10,
                new_rate: 5,
            })
            .await
            .unwrap();

        // Simulate a timeout after one batch
        coordinator.process_next_batch().await.unwrap();
        let progress = coordinator.progress().await;
        assert_eq!(progress.phase, MigrationPhase::Migrating);
        assert_eq!(progress.completed_batches, 1);

        let report = coordinator.resume().await.unwrap();
        assert_eq!(report.rows_recomputed, 5);
        assert_eq!(
            coordinator.progress().await.phase,
            MigrationPhase::Completed
        );
    }

    #[tokio::test]
    async fn test_second_invocation_reports_already_running() {
        let (repo, engine) = create_test_ledger().await;
        credit_order(&engine, "order:1", "customer:1", 100).await;

        let coordinator =
            MigrationCoordinator::with_config(repo, MigrationConfig { batch_size: 1 });
        coordinator
            .begin(RatioChange {
                old_rate: 10,
                new_rate: 5,
            })
            .await
            .unwrap();

        let err = coordinator
            .begin(RatioChange {
                old_rate: 10,
                new_rate: 5,
            })
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::MigrationAlreadyRunning);
    }

    #[tokio::test]
    async fn test_rollback_restores_backup_wholesale() {
        let (repo, engine) = create_test_ledger().await;
        credit_order(&engine, "order:1", "customer:1", 100).await;
        let before = repo.snapshot().await.unwrap();

        let coordinator = MigrationCoordinator::new(repo.clone());
        coordinator
            .run(RatioChange {
                old_rate: 10,
                new_rate: 5,
            })
            .await
            .unwrap();
        assert_eq!(
            repo.balance(&CustomerId::new("customer:1")).await.unwrap(),
            20
        );

        let progress = coordinator.rollback().await.unwrap();
        assert_eq!(progress.phase, MigrationPhase::RolledBack);
        assert_eq!(progress.ratio_version, 1);
        assert_eq!(repo.snapshot().await.unwrap(), before);
        assert_eq!(
            repo.balance(&CustomerId::new("customer:1")).await.unwrap(),
            10
        );
    }

    #[tokio::test]
    async fn test_rollback_without_backup_fails_loudly() {
        let repo = Arc::new(MemoryLedgerRepository::new());
        let coordinator = MigrationCoordinator::new(repo);
        let err = coordinator.rollback().await.unwrap_err();
        assert_eq!(err, EngineError::RollbackUnavailable);
    }

    #[tokio::test]
    async fn test_invalid_ratio_change_rejected_before_work() {
        let repo = Arc::new(MemoryLedgerRepository::new());
        let coordinator = MigrationCoordinator::new(repo);

        let err = coordinator
            .run(RatioChange {
                old_rate: 10,
                new_rate: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRatioChange { .. }));
        assert_eq!(
            coordinator.progress().await.phase,
            MigrationPhase::NotStarted
        );
    }

    #[tokio::test]
    async fn test_batch_step_outside_migrating_is_invalid() {
        let repo = Arc::new(MemoryLedgerRepository::new());
        let coordinator = MigrationCoordinator::new(repo);
        let err = coordinator.process_next_batch().await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidMigrationState { .. }));
    }

    #[tokio::test]
    async fn test_overdrawn_debit_is_clamped_to_zero() {
        let (repo, engine) = create_test_ledger().await;
        credit_order(&engine, "order:1", "customer:1", 100).await; // 10 pts
        // Spend everything before the ratio shrinks the credit
        engine
            .process_redemption(crate::points_engine::RedemptionRequest {
                order_id: OrderId::new("order:2"),
                customer_id: CustomerId::new("customer:1"),
                pending: crate::points_engine::PendingRedemption { points: 10 },
                cart_total: Decimal::from(100),
            })
            .await
            .unwrap();

        // Rate 10 -> 20 halves the purchase credit to 5; the historical
        // 10-point redemption must clamp so the chain bottoms at zero.
        let coordinator = MigrationCoordinator::new(repo.clone());
        coordinator
            .run(RatioChange {
                old_rate: 10,
                new_rate: 20,
            })
            .await
            .unwrap();

        let rows = repo
            .transactions_for_customer(&CustomerId::new("customer:1"))
            .await
            .unwrap();
        assert_eq!(rows[0].points_amount, 5);
        assert_eq!(rows[1].points_amount, -5);
        assert_eq!(rows[1].balance_after, 0);
        assert_eq!(
            repo.balance(&CustomerId::new("customer:1")).await.unwrap(),
            0
        );
    }
}
