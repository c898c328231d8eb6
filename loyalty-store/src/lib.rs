//! Loyalty Ledger Store
//!
//! Durable home of the append-only points ledger. The repository trait
//! is storage-agnostic; the in-memory adapter backs tests and
//! single-process deployments. Balances are cached but must always be
//! provably consistent with the ledger sum.

pub mod error;
pub mod repos;

pub use error::{StoreError, StoreResult};
pub use repos::{
    BalanceMismatch, LedgerAppend, LedgerRepository, MemoryLedgerRepository,
};
