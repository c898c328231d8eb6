//! Points Conversion Test Vectors
//!
//! Pin the floor rule: `points = floor(amount / rate)`, integer result,
//! rate <= 0 rejected, non-positive amounts earn zero.

use serde::{Deserialize, Serialize};

use super::TestVector;

/// Points conversion input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsInput {
    /// Monetary amount as a decimal string
    pub amount: String,
    /// Currency units per point
    pub rate: i64,
}

/// Proportional refund input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundInput {
    /// Points originally credited
    pub original_points: i64,
    /// Refunded fraction as a decimal string
    pub fraction: String,
}

/// Get all points conversion vectors
pub fn all_vectors() -> Vec<TestVector<PointsInput>> {
    vec![
        conversion("points-001", "95 at rate 10 floors to 9, never 9.5", "95", 10, 9)
            .with_tags(vec!["floor", "regression"]),
        conversion("points-002", "9.99 at rate 10 floors to 0", "9.99", 10, 0)
            .with_tags(vec!["floor", "regression"]),
        conversion("points-003", "Exact multiple converts cleanly", "100", 10, 10),
        conversion("points-004", "Zero amount earns zero", "0", 10, 0),
        conversion("points-005", "Negative amount earns zero", "-50", 10, 0),
        conversion("points-006", "Fractional remainder is dropped", "199.99", 10, 19),
        conversion("points-007", "Rate 1 maps one-to-one", "42", 1, 42),
        TestVector::new(
            "points-008",
            "Rate zero is a configuration error",
            PointsInput {
                amount: "100".to_string(),
                rate: 0,
            },
        )
        .should_fail()
        .with_tags(vec!["invalid-rate"]),
        TestVector::new(
            "points-009",
            "Negative rate is a configuration error",
            PointsInput {
                amount: "100".to_string(),
                rate: -10,
            },
        )
        .should_fail()
        .with_tags(vec!["invalid-rate"]),
    ]
}

/// Get all proportional refund vectors
pub fn refund_vectors() -> Vec<TestVector<RefundInput>> {
    vec![
        refund("refund-001", "Half of 10 points is exactly 5", 10, "0.5", 5),
        refund("refund-002", "Full fraction debits the original", 10, "1", 10),
        refund("refund-003", "Thirds floor down", 10, "0.33", 3),
        refund("refund-004", "Zero fraction debits nothing", 10, "0", 0),
    ]
}

fn conversion(
    id: &str,
    description: &str,
    amount: &str,
    rate: i64,
    expected_points: i64,
) -> TestVector<PointsInput> {
    TestVector::new(
        id,
        description,
        PointsInput {
            amount: amount.to_string(),
            rate,
        },
    )
    .with_expected(serde_json::json!({ "points": expected_points }))
}

fn refund(
    id: &str,
    description: &str,
    original_points: i64,
    fraction: &str,
    expected_points: i64,
) -> TestVector<RefundInput> {
    TestVector::new(
        id,
        description,
        RefundInput {
            original_points,
            fraction: fraction.to_string(),
        },
    )
    .with_expected(serde_json::json!({ "points": expected_points }))
}
