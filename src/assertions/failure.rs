//! Failure taxonomy shared by every matcher.

use std::fmt;

use thiserror::Error;

/// Outcome of a pure comparison: `Ok(())` passes, `Err` carries the failure.
pub type Comparison = std::result::Result<(), Failure>;

/// Why a matcher failed, with the human-readable detail as its `Display`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The optional operand was `None`.
    #[error("first value was nil")]
    NilValue,

    /// The operand could not be downcast to the expected type.
    #[error("unable to cast first value from type \"{from}\" to \"{to}\"")]
    CastFailure {
        /// Static type of the operand.
        from: &'static str,
        /// Requested target type.
        to: &'static str,
    },

    /// Both operands were available but not equal.
    #[error("{actual} != {expected}")]
    NotEqual {
        /// `Debug` rendering of the actual value.
        actual: String,
        /// `Debug` rendering of the expected value.
        expected: String,
    },

    /// Evaluating an operand failed.
    #[error("threw error \"{0}\"")]
    ThrownError(String),

    /// The collections have different lengths.
    #[error("count ({actual_count}) is not equal to ({expected_count}) for {actual} and {expected}")]
    CountMismatch {
        /// Length of the actual collection.
        actual_count: usize,
        /// Length of the expected collection.
        expected_count: usize,
        /// `Debug` rendering of the actual collection.
        actual: String,
        /// `Debug` rendering of the expected collection.
        expected: String,
    },

    /// Expected elements have no counterpart in the actual collection.
    #[error("missing {} element(s) {}", .0.len(), ElementList(.0))]
    MissingElements(Vec<String>),

    /// The actual collection holds elements that were not expected.
    #[error("has {} extra element(s) {}", .0.len(), ElementList(.0))]
    ExtraElements(Vec<String>),

    /// Both of the above.
    #[error(
        "missing {} element(s) {} and has {} extra element(s) {}",
        .missing.len(),
        ElementList(.missing),
        .extra.len(),
        ElementList(.extra)
    )]
    MissingAndExtra {
        /// Expected but absent elements, in expected order.
        missing: Vec<String>,
        /// Unexpected elements, in actual order.
        extra: Vec<String>,
    },

    /// A watched instance outlived its test.
    #[error("should have been deallocated \"{type_name}\", possible memory leak")]
    StillAlive {
        /// Type of the leaked instance.
        type_name: &'static str,
    },

    /// The captured operation succeeded.
    #[error("should have thrown an error")]
    NoFailureThrown,

    /// A completion handle was dropped without being invoked.
    #[error("completion was dropped without being invoked")]
    CompletionDropped,

    /// Checked indexing went past the end.
    #[error("index {index} out of range 0..<{len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the indexed sequence.
        len: usize,
    },

    /// An expected-failure block recorded nothing.
    #[error("expected a failure but none was recorded")]
    ExpectedFailureMissing,
}

impl Failure {
    /// The fieldless reason tag of this failure.
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::NilValue => FailureReason::NilValue,
            Self::CastFailure { .. } => FailureReason::CastFailure,
            Self::NotEqual { .. } => FailureReason::NotEqual,
            Self::ThrownError(_) => FailureReason::ThrownError,
            Self::CountMismatch { .. } => FailureReason::CountMismatch,
            Self::MissingElements(_) => FailureReason::MissingElements,
            Self::ExtraElements(_) => FailureReason::ExtraElements,
            Self::MissingAndExtra { .. } => FailureReason::MissingAndExtra,
            Self::StillAlive { .. } => FailureReason::StillAlive,
            Self::NoFailureThrown => FailureReason::NoFailureThrown,
            Self::CompletionDropped => FailureReason::CompletionDropped,
            Self::IndexOutOfRange { .. } => FailureReason::IndexOutOfRange,
            Self::ExpectedFailureMissing => FailureReason::ExpectedFailureMissing,
        }
    }

    /// Create a not-equal failure from two debuggable values.
    pub fn not_equal<A: fmt::Debug + ?Sized, E: fmt::Debug + ?Sized>(actual: &A, expected: &E) -> Self {
        Self::NotEqual {
            actual: format!("{actual:?}"),
            expected: format!("{expected:?}"),
        }
    }

    /// Create a thrown-error failure from anything displayable.
    pub fn thrown(error: impl fmt::Display) -> Self {
        Self::ThrownError(error.to_string())
    }
}

/// Fieldless classification of a [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// See [`Failure::NilValue`].
    NilValue,
    /// See [`Failure::CastFailure`].
    CastFailure,
    /// See [`Failure::NotEqual`].
    NotEqual,
    /// See [`Failure::ThrownError`].
    ThrownError,
    /// See [`Failure::CountMismatch`].
    CountMismatch,
    /// See [`Failure::MissingElements`].
    MissingElements,
    /// See [`Failure::ExtraElements`].
    ExtraElements,
    /// See [`Failure::MissingAndExtra`].
    MissingAndExtra,
    /// See [`Failure::StillAlive`].
    StillAlive,
    /// See [`Failure::NoFailureThrown`].
    NoFailureThrown,
    /// See [`Failure::CompletionDropped`].
    CompletionDropped,
    /// See [`Failure::IndexOutOfRange`].
    IndexOutOfRange,
    /// See [`Failure::ExpectedFailureMissing`].
    ExpectedFailureMissing,
}

struct ElementList<'a>(&'a [String]);

impl fmt::Display for ElementList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
