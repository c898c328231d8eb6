//! Loyalty Conformance Testing Framework
//!
//! Standardized test vectors and suite runners that pin the numeric
//! behavior of the loyalty core:
//!
//! - **Points vectors**: the floor conversion rule, invalid rates,
//!   proportional refund math
//! - **Redemption vectors**: the balance/cart-total bounds, including
//!   the no-fixed-ceiling regression guard
//! - **Commission vectors**: the seven-term stacking pipeline over the
//!   default schedules
//!
//! # Usage
//!
//! ```rust
//! use loyalty_conformance::run_all_conformance_tests;
//!
//! let results = run_all_conformance_tests();
//! assert!(results.all_passed(), "failures: {:?}", results.failures());
//! ```

pub mod conformance;
pub mod vectors;

pub use conformance::{ConformanceResult, SuiteResults};

/// Results across every conformance suite
#[derive(Debug, Clone)]
pub struct AllResults {
    pub suites: Vec<SuiteResults>,
}

impl AllResults {
    /// Whether every suite passed completely
    pub fn all_passed(&self) -> bool {
        self.suites.iter().all(SuiteResults::all_passed)
    }

    /// Failure messages across all suites
    pub fn failures(&self) -> Vec<String> {
        self.suites
            .iter()
            .flat_map(|suite| {
                suite
                    .failures()
                    .into_iter()
                    .map(move |failure| format!("{}/{failure}", suite.name))
            })
            .collect()
    }
}

/// Run every conformance suite
pub fn run_all_conformance_tests() -> AllResults {
    AllResults {
        suites: vec![
            conformance::points::run_conformance_tests(),
            conformance::redemption::run_conformance_tests(),
            conformance::commission::run_conformance_tests(),
        ],
    }
}
