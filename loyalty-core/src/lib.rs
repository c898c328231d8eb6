//! Loyalty Domain Layer - Points and Commission Math
//!
//! The pure domain core of the loyalty program:
//! - **Points**: rate-based earning with integer floor, the fixed 1:1
//!   points/discount mapping, and redemption limits bounded only by
//!   balance and cart total
//! - **Commission**: the seven-term bonus pipeline over a referred order
//! - **Configuration**: immutable rate/tier/season snapshots passed into
//!   every calculation; the core never reads ambient state
//!
//! # Invariants
//!
//! | Invariant | Core Requirement |
//! |-----------|------------------|
//! | **Ledger Sum** | A balance always equals the sum of its ledger rows |
//! | **Integer Points** | Points are `i64` and never fractional |
//! | **Floor Conversion** | Money-to-points is `floor(amount / rate)`, never rounded |
//! | **Bounded Redemption** | Redemption never exceeds `min(balance, cart_total)`; no fixed ceiling |
//! | **Sum-of-Terms** | A breakdown's total is always the arithmetic sum of its seven terms |
//!
//! This crate has no I/O: persistence lives in `loyalty-store`,
//! orchestration (locking, idempotency, migration) in `loyalty-engine`.

pub mod commission;
pub mod error;
pub mod points;
pub mod types;

// Re-export error types
pub use error::{LoyaltyError, LoyaltyResult};

// Re-export all types
pub use types::*;

// Re-export commission pipeline
pub use commission::{CommissionCalculator, CommissionInput};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_surface_is_wired() {
        let calc = CommissionCalculator::default_config();
        assert_eq!(calc.resolve_tier(0), CoachTier::Bronze);

        let points =
            points::points_from_amount(rust_decimal::Decimal::from(100), 10).unwrap();
        assert_eq!(points, 10);
    }
}
