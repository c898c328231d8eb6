//! Commission Stacking Conformance
//!
//! Replays every commission vector against the default schedules and
//! compares each of the seven terms plus the total, then re-verifies
//! that the total is the arithmetic sum of the terms.

use std::str::FromStr;
use std::time::Instant;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use loyalty_core::{
    CoachId, CommissionCalculator, CommissionInput, CustomerId, OrderId, OrderSnapshot,
    OrderStatus,
};

use super::{ConformanceResult, SuiteResults};
use crate::vectors::commission::{all_vectors, CommissionCaseInput};

/// Run the commission conformance suite
pub fn run_conformance_tests() -> SuiteResults {
    let mut suite = SuiteResults::new("commission");
    let calculator = CommissionCalculator::default_config();

    for vector in all_vectors() {
        let start = Instant::now();
        let input = match build_input(&vector.input) {
            Ok(input) => input,
            Err(reason) => {
                suite.add(ConformanceResult::fail(vector.id, start.elapsed(), reason));
                continue;
            }
        };

        let breakdown = match calculator.calculate_total(&input) {
            Ok(breakdown) => breakdown,
            Err(err) => {
                suite.add(ConformanceResult::fail(
                    vector.id,
                    start.elapsed(),
                    err.to_string(),
                ));
                continue;
            }
        };

        if !breakdown.verify_total() {
            suite.add(ConformanceResult::fail(
                vector.id,
                start.elapsed(),
                "total_amount is not the sum of its terms".to_string(),
            ));
            continue;
        }

        let Some(expected) = vector.expected.as_ref() else {
            suite.add(ConformanceResult::fail(
                vector.id,
                start.elapsed(),
                "vector has no expected output".to_string(),
            ));
            continue;
        };

        let pairs = [
            ("base_commission", breakdown.base_commission),
            ("loyalty_bonus", breakdown.loyalty_bonus),
            ("retention_bonus", breakdown.retention_bonus),
            ("network_bonus", breakdown.network_bonus),
            ("tier_bonus", breakdown.tier_bonus),
            ("seasonal_bonus", breakdown.seasonal_bonus),
            ("weekend_bonus", breakdown.weekend_bonus),
            ("total_amount", breakdown.total_amount),
        ];

        let mut mismatch = None;
        for (field, actual) in pairs {
            let expected_value = expected
                .get(field)
                .and_then(serde_json::Value::as_str)
                .and_then(|s| Decimal::from_str(s).ok());
            if expected_value != Some(actual) {
                mismatch = Some(format!(
                    "{field}: expected {expected_value:?}, got {actual}"
                ));
                break;
            }
        }

        let result = match mismatch {
            None => ConformanceResult::pass(vector.id, start.elapsed()),
            Some(reason) => ConformanceResult::fail(vector.id, start.elapsed(), reason),
        };
        suite.add(result);
    }

    suite
}

fn build_input(case: &CommissionCaseInput) -> Result<CommissionInput, String> {
    let net_total = Decimal::from_str(&case.net_total)
        .map_err(|err| format!("bad vector net_total: {err}"))?;
    let date = NaiveDate::parse_from_str(&case.order_date, "%Y-%m-%d")
        .map_err(|err| format!("bad vector order_date: {err}"))?;
    let placed_at = Utc
        .from_local_datetime(&date.and_hms_opt(12, 0, 0).ok_or("bad vector time")?)
        .single()
        .ok_or("ambiguous vector timestamp")?;

    Ok(CommissionInput {
        order: OrderSnapshot {
            order_id: OrderId::new("order:conformance"),
            customer_id: CustomerId::new("customer:conformance"),
            total: net_total,
            tax_total: Decimal::ZERO,
            currency: "CHF".to_string(),
            status: OrderStatus::Completed,
            placed_at,
        },
        coach_id: CoachId::new("coach:conformance"),
        customer_id: CustomerId::new("customer:conformance"),
        purchase_count: case.purchase_count,
        coach_referral_count: case.coach_referral_count,
        seasons_with_referrer: case.seasons_with_referrer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_conformance_suite_passes() {
        let results = run_conformance_tests();
        assert!(
            results.all_passed(),
            "failures: {:?}",
            results.failures()
        );
        assert!(results.total >= 6);
    }
}
