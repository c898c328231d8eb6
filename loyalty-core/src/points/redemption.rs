//! Redemption Limits
//!
//! Redemption is bounded by the customer's balance and the cart total,
//! and by nothing else. There is deliberately no fixed upper cap; any
//! reintroduced ceiling is a regression.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{LoyaltyError, LoyaltyResult};

/// Whether `requested` points can be redeemed against `balance` and
/// `cart_total`. True iff `0 <= requested <= balance` and the 1:1
/// discount fits inside the cart total.
pub fn can_redeem(requested: i64, balance: i64, cart_total: Decimal) -> bool {
    validate(requested, balance, cart_total).is_ok()
}

/// Validate a redemption request, reporting the first violated bound
pub fn validate(requested: i64, balance: i64, cart_total: Decimal) -> LoyaltyResult<()> {
    if requested < 0 {
        return Err(LoyaltyError::NegativeRedemption { requested });
    }
    if requested > balance {
        return Err(LoyaltyError::InsufficientBalance {
            requested,
            available: balance,
        });
    }
    if Decimal::from(requested) > cart_total {
        return Err(LoyaltyError::ExceedsCartTotal {
            requested,
            cart_total,
        });
    }
    Ok(())
}

/// Maximum redeemable points: `min(balance, cart_total)`, with the cart
/// total floored to whole points. No other term participates.
pub fn max_redeemable(balance: i64, cart_total: Decimal) -> i64 {
    if balance <= 0 || cart_total <= Decimal::ZERO {
        return 0;
    }
    let cart_points = cart_total.floor().to_i64().unwrap_or(i64::MAX);
    balance.min(cart_points)
}
