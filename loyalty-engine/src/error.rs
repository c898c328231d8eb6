//! Engine Error Types

use thiserror::Error;

use loyalty_core::LoyaltyError;
use loyalty_store::StoreError;

/// Engine Result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Orchestration-level errors for the points engine and the migration
/// coordinator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Domain validation error
    #[error(transparent)]
    Core(#[from] LoyaltyError),

    /// Ledger store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Backup creation failed; no ledger row was touched
    #[error("Migration backup failed: {reason}")]
    MigrationBackupFailed { reason: String },

    /// Post-migration re-sum disagreed with a stored balance snapshot
    #[error(
        "Migration verification failed for customer {customer_id}: \
         ledger sum {ledger_sum}, stored balance {stored_balance}"
    )]
    MigrationVerificationFailed {
        customer_id: String,
        ledger_sum: i64,
        stored_balance: i64,
    },

    /// Rollback requested but no backup exists
    #[error("Rollback unavailable: no backup exists")]
    RollbackUnavailable,

    /// A migration run is already in progress; first invocation wins
    #[error("Migration already running")]
    MigrationAlreadyRunning,

    /// Operation not valid in the coordinator's current phase
    #[error("Invalid migration state: expected {expected}, found {actual}")]
    InvalidMigrationState { expected: String, actual: String },

    /// Ratio change rejected before any work started
    #[error("Invalid ratio change: {reason}")]
    InvalidRatioChange { reason: String },
}

impl EngineError {
    /// Whether the error is a caller-facing validation failure
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Core(err) => err.is_validation(),
            Self::InvalidRatioChange { .. } => true,
            _ => false,
        }
    }
}
