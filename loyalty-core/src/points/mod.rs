//! Points Calculation
//!
//! Rate-based conversion between money and points, and the fixed 1:1
//! points/discount mapping. All functions are pure; integer floor is the
//! single conversion rule so sequential and batch calculations agree
//! exactly.

pub mod redemption;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{LoyaltyError, LoyaltyResult};

/// Points earned for a monetary amount at the given rate.
///
/// `rate` is currency units per 1 point (rate 10: CHF 10 -> 1 point).
/// The result is `floor(amount / rate)`; floor, not round, so customers
/// are never over-credited. Negative or zero amounts earn 0 points.
pub fn points_from_amount(amount: Decimal, rate: i64) -> LoyaltyResult<i64> {
    if rate <= 0 {
        return Err(LoyaltyError::InvalidRate { rate });
    }
    if amount <= Decimal::ZERO {
        return Ok(0);
    }
    let points = (amount / Decimal::from(rate)).floor();
    points
        .to_i64()
        .ok_or_else(|| LoyaltyError::InvalidPointsValue {
            reason: format!("points overflow for amount {amount} at rate {rate}"),
        })
}

/// Discount value of a point balance: fixed 1:1, 1 point = 1 currency unit
pub fn discount_from_points(points: i64) -> Decimal {
    if points <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(points)
}

/// Points needed to cover a discount amount: fixed 1:1, floored to whole
/// points so the conversion can never produce a fractional point
pub fn points_from_discount(amount: Decimal) -> i64 {
    if amount <= Decimal::ZERO {
        return 0;
    }
    amount.floor().to_i64().unwrap_or(i64::MAX)
}

/// Proportional refund debit: `floor(original_points * fraction)`.
///
/// Used for partial monetary refunds; full refunds bypass this and debit
/// the stored original point amount exactly.
pub fn proportional_points(original_points: i64, fraction: Decimal) -> LoyaltyResult<i64> {
    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(LoyaltyError::InvalidPointsValue {
            reason: format!("refund fraction {fraction} outside [0, 1]"),
        });
    }
    let scaled = (Decimal::from(original_points) * fraction).floor();
    scaled
        .to_i64()
        .ok_or_else(|| LoyaltyError::InvalidPointsValue {
            reason: format!("refund points overflow for {original_points} * {fraction}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_points_use_floor_not_round() {
        // 95 / 10 must be 9, never 9.5 or 10
        assert_eq!(
            points_from_amount(Decimal::from(95), 10).unwrap(),
            9
        );
        // 9.99 / 10 must be 0
        assert_eq!(
            points_from_amount(Decimal::from_str("9.99").unwrap(), 10).unwrap(),
            0
        );
        assert_eq!(
            points_from_amount(Decimal::from_str("99.99").unwrap(), 10).unwrap(),
            9
        );
    }

    #[test]
    fn test_sequential_and_batch_agree() {
        // The same floor rule applied per order keeps a two-order sequence
        // consistent with itself: 95 + 95 credited separately is 9 + 9.
        let a = points_from_amount(Decimal::from(95), 10).unwrap();
        let b = points_from_amount(Decimal::from(95), 10).unwrap();
        assert_eq!(a + b, 18);
    }

    #[test]
    fn test_non_positive_amounts_earn_zero() {
        assert_eq!(points_from_amount(Decimal::ZERO, 10).unwrap(), 0);
        assert_eq!(points_from_amount(Decimal::from(-50), 10).unwrap(), 0);
    }

    #[test]
    fn test_invalid_rate_is_reported_not_substituted() {
        let err = points_from_amount(Decimal::from(100), 0).unwrap_err();
        assert_eq!(err.code(), "LOY-POINTS-001");
        let err = points_from_amount(Decimal::from(100), -10).unwrap_err();
        assert_eq!(err.code(), "LOY-POINTS-001");
    }

    #[test]
    fn test_discount_mapping_is_one_to_one() {
        assert_eq!(discount_from_points(10), Decimal::from(10));
        assert_eq!(discount_from_points(0), Decimal::ZERO);
        assert_eq!(discount_from_points(-5), Decimal::ZERO);

        assert_eq!(points_from_discount(Decimal::from(10)), 10);
        assert_eq!(points_from_discount(Decimal::from_str("10.99").unwrap()), 10);
        assert_eq!(points_from_discount(Decimal::from(-3)), 0);
    }

    #[test]
    fn test_proportional_points_floors() {
        // 50% of 10 points is exactly 5
        assert_eq!(
            proportional_points(10, Decimal::from_str("0.5").unwrap()).unwrap(),
            5
        );
        // 33% of 10 floors to 3
        assert_eq!(
            proportional_points(10, Decimal::from_str("0.33").unwrap()).unwrap(),
            3
        );
        assert_eq!(proportional_points(10, Decimal::ONE).unwrap(), 10);
        assert_eq!(proportional_points(10, Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_proportional_points_rejects_out_of_range_fraction() {
        let err = proportional_points(10, Decimal::from(2)).unwrap_err();
        assert_eq!(err.code(), "LOY-POINTS-002");
    }
}
