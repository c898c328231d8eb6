//! Loyalty Engine - Ledger Orchestration
//!
//! Coordinates the pure domain math of `loyalty-core` with the
//! append-only ledger of `loyalty-store`:
//! - [`PointsEngine`]: allocation, refunds, staged redemption and manual
//!   adjustments, serialized per customer and idempotent per order
//! - [`MigrationCoordinator`]: the guarded, resumable batch job that
//!   rewrites purchase-derived rows when the points ratio changes
//!
//! Every mutation validates before it appends; a failing call leaves the
//! ledger exactly as it found it.

pub mod error;
pub mod locks;
pub mod migration;
pub mod points_engine;

// Re-export error types
pub use error::{EngineError, EngineResult};

// Re-export the points engine
pub use points_engine::{
    AllocationOutcome, PendingRedemption, PointsEngine, RedemptionOutcome, RedemptionRequest,
    RefundOutcome, TransactionRequest,
};

// Re-export the migration coordinator
pub use migration::{
    MigrationConfig, MigrationCoordinator, MigrationPhase, MigrationProgress, MigrationReport,
    RatioChange,
};
