//! Error definitions
//!
//! This module provides the crate-level error type for tddkit.
//!
//! Assertion failures are never returned as errors: they are recorded on a
//! [`TestContext`](crate::TestContext) and the test keeps running. The only
//! fallible operation is [`TestContext::finish`](crate::TestContext::finish),
//! which turns the collected issues into a single [`Error`].

use thiserror::Error;

/// Boxed error used to capture failures thrown by lazily evaluated operands.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for tddkit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One or more issues were recorded while the test ran.
    #[error("{count} issue(s) recorded in {test}:\n{report}")]
    IssuesRecorded {
        /// Name of the test context.
        test: String,
        /// Number of recorded issues.
        count: usize,
        /// One line per recorded issue.
        report: String,
    },
}

impl Error {
    /// Create an issues-recorded error from a rendered report.
    #[must_use]
    pub fn issues_recorded(test: impl Into<String>, count: usize, report: impl Into<String>) -> Self {
        Self::IssuesRecorded {
            test: test.into(),
            count,
            report: report.into(),
        }
    }

    /// Number of issues carried by this error.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        match self {
            Self::IssuesRecorded { count, .. } => *count,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
