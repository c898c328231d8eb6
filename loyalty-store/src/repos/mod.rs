//! Ledger Repositories

pub mod ledger_repo;
pub mod memory_ledger_repo;

pub use ledger_repo::{BalanceMismatch, LedgerAppend, LedgerRepository};
pub use memory_ledger_repo::MemoryLedgerRepository;
