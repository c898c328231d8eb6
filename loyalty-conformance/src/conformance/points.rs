//! Points Conversion Conformance

use std::str::FromStr;
use std::time::Instant;

use rust_decimal::Decimal;

use loyalty_core::points;

use super::{ConformanceResult, SuiteResults};
use crate::vectors::points::{all_vectors, refund_vectors};

/// Run the points conversion conformance suite
pub fn run_conformance_tests() -> SuiteResults {
    let mut suite = SuiteResults::new("points");

    for vector in all_vectors() {
        let start = Instant::now();
        let amount = match Decimal::from_str(&vector.input.amount) {
            Ok(amount) => amount,
            Err(err) => {
                suite.add(ConformanceResult::fail(
                    vector.id,
                    start.elapsed(),
                    format!("bad vector amount: {err}"),
                ));
                continue;
            }
        };

        let outcome = points::points_from_amount(amount, vector.input.rate);
        let result = match (outcome, vector.should_succeed) {
            (Ok(points), true) => {
                let expected = vector
                    .expected
                    .as_ref()
                    .and_then(|e| e.get("points"))
                    .and_then(serde_json::Value::as_i64);
                if expected == Some(points) {
                    ConformanceResult::pass(vector.id, start.elapsed())
                } else {
                    ConformanceResult::fail(
                        vector.id,
                        start.elapsed(),
                        format!("expected {expected:?}, got {points}"),
                    )
                }
            }
            (Err(_), false) => ConformanceResult::pass(vector.id, start.elapsed()),
            (Ok(points), false) => ConformanceResult::fail(
                vector.id,
                start.elapsed(),
                format!("expected an error, got {points}"),
            ),
            (Err(err), true) => {
                ConformanceResult::fail(vector.id, start.elapsed(), err.to_string())
            }
        };
        suite.add(result);
    }

    for vector in refund_vectors() {
        let start = Instant::now();
        let fraction = match Decimal::from_str(&vector.input.fraction) {
            Ok(fraction) => fraction,
            Err(err) => {
                suite.add(ConformanceResult::fail(
                    vector.id,
                    start.elapsed(),
                    format!("bad vector fraction: {err}"),
                ));
                continue;
            }
        };

        let result =
            match points::proportional_points(vector.input.original_points, fraction) {
                Ok(points) => {
                    let expected = vector
                        .expected
                        .as_ref()
                        .and_then(|e| e.get("points"))
                        .and_then(serde_json::Value::as_i64);
                    if expected == Some(points) {
                        ConformanceResult::pass(vector.id, start.elapsed())
                    } else {
                        ConformanceResult::fail(
                            vector.id,
                            start.elapsed(),
                            format!("expected {expected:?}, got {points}"),
                        )
                    }
                }
                Err(err) => {
                    ConformanceResult::fail(vector.id, start.elapsed(), err.to_string())
                }
            };
        suite.add(result);
    }

    suite
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_conformance_suite_passes() {
        let results = run_conformance_tests();
        assert!(
            results.all_passed(),
            "failures: {:?}",
            results.failures()
        );
        assert!(results.total >= 13);
    }
}
