//! Soft failure reports and the errors that carry them.
//!
//! The report layout is consumed by downstream log parsers and must not
//! change:
//!
//! ```text
//!
//! **SOFT ASSERTIONS ERRORS**
//! Asserts down: 2
//! 	first message
//! 	second message
//! **END SOFT ASSERTIONS ERRORS**
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// First line of a soft failure report
pub const REPORT_HEADER: &str = "**SOFT ASSERTIONS ERRORS**";

/// Last line of a soft failure report
pub const REPORT_FOOTER: &str = "**END SOFT ASSERTIONS ERRORS**";

/// Build the multi-line report for a list of failure messages.
///
/// Messages appear one per line, tab-indented, in the order given.
#[must_use]
pub fn format_message<S: AsRef<str>>(messages: &[S]) -> String {
    let mut report = format!("\n{REPORT_HEADER}\nAsserts down: {}", messages.len());
    for message in messages {
        let _ = write!(report, "\n\t{}", message.as_ref());
    }
    report.push('\n');
    report.push_str(REPORT_FOOTER);
    report.push('\n');
    report
}

/// Aggregated failure returned by `flush` when soft checks failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftAssertionError {
    /// All failure messages, in the order they were recorded
    pub failures: Vec<String>,
    /// Number of failed checks
    pub count: usize,
}

impl SoftAssertionError {
    /// Name reported to the test runner for aggregated failures
    pub const NAME: &'static str = "SoftAssertionError";

    /// Create a new error from recorded failure messages
    #[must_use]
    pub fn new(failures: Vec<String>) -> Self {
        let count = failures.len();
        Self { failures, count }
    }

    /// Error name as shown by the runner
    #[must_use]
    pub const fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Formatted report of every failure
    #[must_use]
    pub fn message(&self) -> String {
        format_message(&self.failures)
    }
}

impl std::fmt::Display for SoftAssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for SoftAssertionError {}

/// Where a [`TestFailure`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailureOrigin {
    /// Any error raised outside the accumulator (hard assertion, runtime error)
    #[default]
    Foreign,
    /// An aggregated soft-assertion failure
    SoftAssertions,
}

/// An error on its way to the runner's reporting layer.
///
/// Harnesses convert whatever they caught into this shape so the accumulator
/// can append its report before the failure is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    /// Error name (e.g. `AssertionError`)
    pub name: String,
    /// Error message
    pub message: String,
    /// Origin of the error
    #[serde(default)]
    pub origin: FailureOrigin,
}

impl TestFailure {
    /// Create a foreign failure
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            origin: FailureOrigin::Foreign,
        }
    }

    /// Wrap any error value as a foreign failure named `Error`
    #[must_use]
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self::new("Error", error.to_string())
    }

    /// Whether this failure is an aggregated soft-assertion failure
    #[must_use]
    pub fn is_soft_assertion(&self) -> bool {
        self.origin == FailureOrigin::SoftAssertions
    }
}

impl From<SoftAssertionError> for TestFailure {
    fn from(err: SoftAssertionError) -> Self {
        Self {
            name: SoftAssertionError::NAME.to_string(),
            message: err.message(),
            origin: FailureOrigin::SoftAssertions,
        }
    }
}

impl std::fmt::Display for TestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for TestFailure {}
