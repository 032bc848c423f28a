//! Recorded issues and their source locations.

use std::fmt;
use std::panic::Location;

use crate::assertions::{Failure, FailureReason};

/// Where in the test source an assertion was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Source file path as reported by the compiler.
    pub file: &'static str,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl SourceLocation {
    /// The location of the caller of the current `#[track_caller]` function.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Whether the issue is a failed assertion or an error thrown while evaluating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// An assertion did not hold.
    AssertionFailure,
    /// Evaluating an operand failed.
    ThrownError,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::AssertionFailure => write!(f, "assertion failure"),
            IssueKind::ThrownError => write!(f, "thrown error"),
        }
    }
}

/// A single failure recorded on a [`Reporter`](crate::Reporter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Failed assertion or thrown error.
    pub kind: IssueKind,
    /// Name of the helper that recorded the issue.
    pub assertion: &'static str,
    /// What went wrong.
    pub failure: Failure,
    /// Optional label supplied by the test author.
    pub message: Option<String>,
    /// Call site of the helper.
    pub location: SourceLocation,
}

impl Issue {
    /// Create an issue. An empty message is treated as no message.
    #[must_use]
    pub fn new(
        assertion: &'static str,
        failure: Failure,
        message: &str,
        location: SourceLocation,
    ) -> Self {
        let kind = match failure {
            Failure::ThrownError(_) => IssueKind::ThrownError,
            _ => IssueKind::AssertionFailure,
        };
        Self {
            kind,
            assertion,
            failure,
            message: (!message.is_empty()).then(|| message.to_string()),
            location,
        }
    }

    /// Shorthand for `self.failure.reason()`.
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        self.failure.reason()
    }

    /// The issue text without its location.
    #[must_use]
    pub fn description(&self) -> String {
        match &self.message {
            Some(message) => format!("{} failed: {} - {}", self.assertion, self.failure, message),
            None => format!("{} failed: {}", self.assertion, self.failure),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.location)
    }
}
