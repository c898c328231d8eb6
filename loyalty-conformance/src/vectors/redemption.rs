//! Redemption Limit Test Vectors
//!
//! Redemption is bounded by balance and cart total only; the 500/350
//! vector guards against any reintroduced fixed ceiling.

use serde::{Deserialize, Serialize};

use super::TestVector;

/// Redemption check input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionInput {
    pub balance: i64,
    /// Cart total as a decimal string
    pub cart_total: String,
    pub requested: i64,
}

/// Get all redemption vectors
pub fn all_vectors() -> Vec<TestVector<RedemptionInput>> {
    vec![
        redemption(
            "redeem-001",
            "500 points on a 350 cart redeems exactly 350; no fixed ceiling",
            500,
            "350",
            350,
            true,
            350,
        )
        .with_tags(vec!["regression", "no-ceiling"]),
        redemption(
            "redeem-002",
            "Requests beyond the cart total are refused",
            500,
            "350",
            351,
            false,
            350,
        ),
        redemption(
            "redeem-003",
            "Requests beyond the balance are refused",
            100,
            "350",
            101,
            false,
            100,
        ),
        redemption(
            "redeem-004",
            "Negative requests are refused",
            100,
            "100",
            -1,
            false,
            100,
        ),
        redemption(
            "redeem-005",
            "Zero request is always allowed",
            100,
            "100",
            0,
            true,
            100,
        ),
        redemption(
            "redeem-006",
            "Exact balance on a matching cart is allowed",
            100,
            "100",
            100,
            true,
            100,
        ),
        redemption(
            "redeem-007",
            "Fractional cart totals floor the limit",
            500,
            "350.75",
            350,
            true,
            350,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn redemption(
    id: &str,
    description: &str,
    balance: i64,
    cart_total: &str,
    requested: i64,
    expected_allowed: bool,
    expected_max: i64,
) -> TestVector<RedemptionInput> {
    TestVector::new(
        id,
        description,
        RedemptionInput {
            balance,
            cart_total: cart_total.to_string(),
            requested,
        },
    )
    .with_expected(serde_json::json!({
        "allowed": expected_allowed,
        "max_redeemable": expected_max
    }))
}
