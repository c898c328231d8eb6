//! Commission Stacking Test Vectors
//!
//! Pin the seven-term pipeline against the default schedules: bucket
//! rates, tier percentages, retention/network amounts, seasonal windows
//! and the weekend gate. Amounts are decimal strings; the expected
//! total is always the exact sum of the seven terms.

use serde::{Deserialize, Serialize};

use super::TestVector;

/// Commission calculation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionCaseInput {
    /// Taxed-out order amount as a decimal string
    pub net_total: String,
    /// 1-based purchase count with this referrer
    pub purchase_count: u32,
    /// The coach's current referral count
    pub coach_referral_count: u32,
    /// 1-based season ordinal with this referrer
    pub seasons_with_referrer: u32,
    /// Order date (YYYY-MM-DD)
    pub order_date: String,
}

/// Get all commission vectors
pub fn all_vectors() -> Vec<TestVector<CommissionCaseInput>> {
    vec![
        case(
            "comm-001",
            "First purchase, regular weekday, no bonuses",
            ("1000", 1, 0, 1, "2025-06-10"),
            ("100", "10", "0", "0", "0", "0", "0", "110"),
        )
        .with_tags(vec!["buckets"]),
        case(
            "comm-002",
            "Second purchase: base drops, loyalty rises",
            ("1000", 2, 0, 1, "2025-06-10"),
            ("70", "20", "0", "0", "0", "0", "0", "90"),
        )
        .with_tags(vec!["buckets"]),
        case(
            "comm-003",
            "Third purchase reaches the final bucket",
            ("1000", 3, 0, 1, "2025-06-10"),
            ("50", "30", "0", "0", "0", "0", "0", "80"),
        )
        .with_tags(vec!["buckets"]),
        case(
            "comm-004",
            "Ninth purchase uses the same bucket as the third",
            ("1000", 9, 0, 1, "2025-06-10"),
            ("50", "30", "0", "0", "0", "0", "0", "80"),
        )
        .with_tags(vec!["buckets", "cap"]),
        case(
            "comm-005",
            "Holiday Saturday with Silver coach, 3rd season, 14 referrals",
            ("1000", 1, 14, 3, "2025-12-20"),
            ("100", "10", "25", "20", "20", "50", "15", "240"),
        )
        .with_tags(vec!["stacking", "seasonal", "weekend"]),
        case(
            "comm-006",
            "Platinum coach in spring on a Saturday, 2nd season",
            ("200", 1, 30, 2, "2025-03-15"),
            ("20", "2", "10", "100", "16", "4", "3", "155"),
        )
        .with_tags(vec!["stacking", "tier"]),
    ]
}

#[allow(clippy::type_complexity)]
fn case(
    id: &str,
    description: &str,
    input: (&str, u32, u32, u32, &str),
    expected: (&str, &str, &str, &str, &str, &str, &str, &str),
) -> TestVector<CommissionCaseInput> {
    let (net_total, purchase_count, coach_referral_count, seasons_with_referrer, order_date) =
        input;
    let (base, loyalty, retention, network, tier, seasonal, weekend, total) = expected;
    TestVector::new(
        id,
        description,
        CommissionCaseInput {
            net_total: net_total.to_string(),
            purchase_count,
            coach_referral_count,
            seasons_with_referrer,
            order_date: order_date.to_string(),
        },
    )
    .with_expected(serde_json::json!({
        "base_commission": base,
        "loyalty_bonus": loyalty,
        "retention_bonus": retention,
        "network_bonus": network,
        "tier_bonus": tier,
        "seasonal_bonus": seasonal,
        "weekend_bonus": weekend,
        "total_amount": total
    }))
}
