//! Conformance Test Module
//!
//! Runs the standardized vectors against the `loyalty-core`
//! implementation and tallies results per suite.

pub mod commission;
pub mod points;
pub mod redemption;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Conformance test result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceResult {
    /// Test vector ID
    pub vector_id: String,
    /// Whether the test passed
    pub passed: bool,
    /// Execution time
    pub duration_ms: u64,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl ConformanceResult {
    /// Create a passing result
    pub fn pass(vector_id: impl Into<String>, duration: Duration) -> Self {
        Self {
            vector_id: vector_id.into(),
            passed: true,
            duration_ms: duration.as_millis() as u64,
            error: None,
        }
    }

    /// Create a failing result
    pub fn fail(
        vector_id: impl Into<String>,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            vector_id: vector_id.into(),
            passed: false,
            duration_ms: duration.as_millis() as u64,
            error: Some(error.into()),
        }
    }
}

/// Conformance test suite results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite name
    pub name: String,
    /// Total tests
    pub total: usize,
    /// Passed tests
    pub passed: usize,
    /// Failed tests
    pub failed: usize,
    /// Individual results
    pub results: Vec<ConformanceResult>,
}

impl SuiteResults {
    /// Create new suite results
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total: 0,
            passed: 0,
            failed: 0,
            results: Vec::new(),
        }
    }

    /// Record one result
    pub fn add(&mut self, result: ConformanceResult) {
        self.total += 1;
        if result.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Whether every test in the suite passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Failure messages for reporting
    pub fn failures(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| {
                format!(
                    "{}: {}",
                    r.vector_id,
                    r.error.as_deref().unwrap_or("unknown failure")
                )
            })
            .collect()
    }
}
