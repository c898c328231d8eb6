//! Redemption Limit Conformance

use std::str::FromStr;
use std::time::Instant;

use rust_decimal::Decimal;

use loyalty_core::points::redemption;

use super::{ConformanceResult, SuiteResults};
use crate::vectors::redemption::all_vectors;

/// Run the redemption limit conformance suite
pub fn run_conformance_tests() -> SuiteResults {
    let mut suite = SuiteResults::new("redemption");

    for vector in all_vectors() {
        let start = Instant::now();
        let cart_total = match Decimal::from_str(&vector.input.cart_total) {
            Ok(total) => total,
            Err(err) => {
                suite.add(ConformanceResult::fail(
                    vector.id,
                    start.elapsed(),
                    format!("bad vector cart_total: {err}"),
                ));
                continue;
            }
        };

        let allowed =
            redemption::can_redeem(vector.input.requested, vector.input.balance, cart_total);
        let max_redeemable = redemption::max_redeemable(vector.input.balance, cart_total);

        let expected_allowed = vector
            .expected
            .as_ref()
            .and_then(|e| e.get("allowed"))
            .and_then(serde_json::Value::as_bool);
        let expected_max = vector
            .expected
            .as_ref()
            .and_then(|e| e.get("max_redeemable"))
            .and_then(serde_json::Value::as_i64);

        let result = if expected_allowed == Some(allowed) && expected_max == Some(max_redeemable)
        {
            ConformanceResult::pass(vector.id, start.elapsed())
        } else {
            ConformanceResult::fail(
                vector.id,
                start.elapsed(),
                format!(
                    "expected allowed={expected_allowed:?} max={expected_max:?}, \
                     got allowed={allowed} max={max_redeemable}"
                ),
            )
        };
        suite.add(result);
    }

    suite
}
