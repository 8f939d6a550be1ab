//! Deployed-endpoint validation.
//!
//! # Data Flow
//! ```text
//! api-probe monitor:
//!     GET /health, /hello, /echo, error paths
//!         → Observed (status, monitoring headers, JSON body)
//!         → inspect_* → CheckResult
//!
//! api-probe perf:
//!     run_load (N requests, C in flight) → Vec<Sample>
//!         → LatencySummary → Thresholds::evaluate → Verdict
//! ```
//!
//! # Design Decisions
//! - Inspection is pure over `Observed`, so it is testable without a network
//! - A failed check never aborts the run; every check reports

pub mod monitor;
pub mod perf;

use serde::Serialize;
use serde_json::Value;

pub use monitor::{Monitor, Observed};
pub use perf::{run_load, LatencySummary, Sample, Thresholds, Verdict};

/// Outcome of one validation check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// `(passed, total)` across a set of checks.
pub fn tally(results: &[CheckResult]) -> (usize, usize) {
    let passed = results.iter().filter(|r| r.passed).count();
    (passed, results.len())
}
