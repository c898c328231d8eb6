//! Test Vectors Module
//!
//! Standardized test vectors for loyalty conformance testing. These
//! vectors pin the numeric rules (floor conversion, redemption bounds,
//! bonus stacking) so every implementation agrees exactly.

pub mod commission;
pub mod points;
pub mod redemption;

use serde::{Deserialize, Serialize};

/// Test vector for any operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector<T> {
    /// Test vector ID
    pub id: String,
    /// Description
    pub description: String,
    /// Input data
    pub input: T,
    /// Expected output (if applicable)
    pub expected: Option<serde_json::Value>,
    /// Whether this should succeed
    pub should_succeed: bool,
    /// Tags for categorization
    pub tags: Vec<String>,
}

impl<T> TestVector<T> {
    /// Create a new test vector
    pub fn new(id: impl Into<String>, description: impl Into<String>, input: T) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            input,
            expected: None,
            should_succeed: true,
            tags: Vec::new(),
        }
    }

    /// Set expected output
    pub fn with_expected(mut self, expected: serde_json::Value) -> Self {
        self.expected = Some(expected);
        self
    }

    /// Mark as should fail
    pub fn should_fail(mut self) -> Self {
        self.should_succeed = false;
        self
    }

    /// Add tags
    pub fn with_tags(mut self, tags: Vec<&str>) -> Self {
        self.tags = tags.into_iter().map(String::from).collect();
        self
    }
}
