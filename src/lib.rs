//! # tddkit
//!
//! > Assertions that record instead of panic, for test-driven Rust
//!
//! **tddkit** collects assertion failures on a [`TestContext`] so one test
//! reports every broken expectation at once, and adds the helpers that plain
//! `assert_eq!` does not cover: order-independent collection equality,
//! downcast-then-compare, capturing expected errors, sampling what a
//! publisher emits and checking that shared objects are released.
//!
//! ## Quick Start
//!
//! ```rust
//! use tddkit::prelude::*;
//!
//! let cx = TestContext::new("quick_start");
//! let error = AnyError::new();
//!
//! let captured = cx.capture_error(|| -> std::result::Result<(), BoxError> { Err(Box::new(error)) }, "");
//! assert_contains_eq!(cx, vec!["getAge", "getUsername"], ["getUsername", "getAge"]);
//! assert_some_cast_eq!(cx, captured, error);
//!
//! assert!(cx.finish().is_ok());
//! ```
//!
//! ## Features
//!
//! - **Multiset equality** - [`assert_contains_eq!`] reports missing and extra elements
//! - **Cast equality** - [`assert_cast_eq!`] unwraps, downcasts and compares
//! - **Error capture** - [`TestContext::capture_error`] and its async forms
//! - **Output sampling** - [`capture::capture_output`] over any [`publisher::Publisher`]
//! - **Leak checks** - [`TestContext::expect_deallocation`] at teardown
//! - **Checked indexing** - [`CheckedIndex`] records out-of-range access

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assertions;
pub mod capture;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod leak;
pub mod logging;
pub mod publisher;

/// Prelude for convenient imports
///
/// ```rust
/// use tddkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::assertions::{CheckedIndex, Failure, FailureReason};
    pub use crate::capture::{capture_output, capture_output_of, Completion, DEFAULT_DROP_FIRST};
    pub use crate::context::{ContextConfig, Issue, Reporter, TestContext};
    pub use crate::error::{BoxError, Error, Result};
    pub use crate::fixtures::AnyError;
    pub use crate::publisher::{PassthroughSubject, Published, Publisher};
    pub use crate::{assert_cast_eq, assert_contains_eq, assert_count_eq, assert_some_cast_eq};
}

// Re-exports
pub use assertions::{CheckedIndex, Comparison, Failure, FailureReason};
pub use context::{ContextConfig, Issue, IssueKind, Reporter, SourceLocation, TestContext};
pub use error::{BoxError, Error, Result};
pub use fixtures::AnyError;

// Re-export the macros when the macros feature is enabled
#[cfg(feature = "macros")]
pub use tddkit_macros::{test, CaseDebug};
