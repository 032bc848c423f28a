//! Comparison matchers that record instead of panicking.
//!
//! Every matcher comes in two layers:
//!
//! - a pure function returning a [`Comparison`] ([`compare_contains`],
//!   [`compare_cast`], [`compare_some_cast`], [`compare_count`]);
//! - a `#[track_caller]` method on [`TestContext`](crate::TestContext) that
//!   records the failure, if any, at the caller's location.
//!
//! The macros ([`assert_contains_eq!`], [`assert_cast_eq!`],
//! [`assert_some_cast_eq!`], [`assert_count_eq!`]) evaluate their operands
//! lazily inside a fallible closure, so an operand written with `?` is
//! reported as a thrown error instead of aborting the test.
//!
//! # Example
//!
//! ```rust
//! use tddkit::{assert_contains_eq, TestContext};
//!
//! let cx = TestContext::new("assertions");
//! assert_contains_eq!(cx, vec!["getAge", "getUsername"], ["getUsername", "getAge"]);
//! assert!(cx.finish().is_ok());
//! ```

mod cast;
mod count;
mod failure;
mod index;
mod multiset;

pub use cast::{compare_cast, compare_some_cast, Downcast};
pub use count::compare_count;
pub use failure::{Comparison, Failure, FailureReason};
pub use index::CheckedIndex;
pub use multiset::{compare_contains, multiset_difference, MultisetDiff};

#[doc(hidden)]
#[macro_export]
macro_rules! __evaluate_operands {
    ($cx:expr, $assertion:literal, $method:ident, |$a:ident, $e:ident| $call:expr, $actual:expr, $expected:expr, $($arg:tt)*) => {{
        let cx: &$crate::TestContext = &$cx;
        let message = ::std::format!($($arg)*);
        #[allow(clippy::redundant_closure_call)]
        let operands = (|| -> ::std::result::Result<_, $crate::BoxError> {
            ::std::result::Result::Ok(($actual, $expected))
        })();
        match operands {
            ::std::result::Result::Ok(($a, $e)) => {
                let (lhs, rhs) = $call;
                cx.$method(lhs, rhs, &message)
            }
            ::std::result::Result::Err(error) => cx.record_thrown($assertion, &error, &message),
        }
    }};
}

/// Assert that two collections hold the same elements in any order.
///
/// Operands may use `?`; an `Err` is recorded as a thrown error.
///
/// # Example
///
/// ```rust
/// use tddkit::{assert_contains_eq, TestContext};
///
/// let cx = TestContext::new("contains_eq");
/// assert_contains_eq!(cx, [3, 1, 2], [1, 2, 3], "ids after {}", "refresh");
/// assert!(cx.finish().is_ok());
/// ```
#[macro_export]
macro_rules! assert_contains_eq {
    ($cx:expr, $actual:expr, $expected:expr $(,)?) => {
        $crate::assert_contains_eq!($cx, $actual, $expected, "")
    };
    ($cx:expr, $actual:expr, $expected:expr, $($arg:tt)+) => {
        $crate::__evaluate_operands!(
            $cx, "assert_contains_equal", assert_contains_equal,
            |actual, expected| (&actual[..], &expected[..]),
            $actual, $expected, $($arg)+
        )
    };
}

/// Assert that two collections are equal, reporting a length mismatch first.
#[macro_export]
macro_rules! assert_count_eq {
    ($cx:expr, $actual:expr, $expected:expr $(,)?) => {
        $crate::assert_count_eq!($cx, $actual, $expected, "")
    };
    ($cx:expr, $actual:expr, $expected:expr, $($arg:tt)+) => {
        $crate::__evaluate_operands!(
            $cx, "assert_count_equal", assert_count_equal,
            |actual, expected| (&actual[..], &expected[..]),
            $actual, $expected, $($arg)+
        )
    };
}

/// Assert that a value downcasts to the expected type and equals it.
///
/// # Example
///
/// ```rust
/// use tddkit::{assert_cast_eq, AnyError, BoxError, TestContext};
///
/// let cx = TestContext::new("cast_eq");
/// let error = AnyError::new();
/// let captured: BoxError = Box::new(error);
/// assert_cast_eq!(cx, captured, error);
/// assert!(cx.finish().is_ok());
/// ```
#[macro_export]
macro_rules! assert_cast_eq {
    ($cx:expr, $actual:expr, $expected:expr $(,)?) => {
        $crate::assert_cast_eq!($cx, $actual, $expected, "")
    };
    ($cx:expr, $actual:expr, $expected:expr, $($arg:tt)+) => {
        $crate::__evaluate_operands!(
            $cx, "assert_cast_equal", assert_cast_equal,
            |actual, expected| (&actual, &expected),
            $actual, $expected, $($arg)+
        )
    };
}

/// Assert that an `Option` is `Some`, downcasts to the expected type and equals it.
///
/// The first operand may be an owned `Option<V>` or an `Option<&V>`.
///
/// # Example
///
/// ```rust
/// use tddkit::{assert_some_cast_eq, AnyError, BoxError, TestContext};
///
/// let cx = TestContext::new("some_cast_eq");
/// let error = AnyError::new();
/// let captured: Option<BoxError> = Some(Box::new(error));
/// assert_some_cast_eq!(cx, captured.as_ref(), error);
/// assert!(cx.finish().is_ok());
/// ```
#[macro_export]
macro_rules! assert_some_cast_eq {
    ($cx:expr, $actual:expr, $expected:expr $(,)?) => {
        $crate::assert_some_cast_eq!($cx, $actual, $expected, "")
    };
    ($cx:expr, $actual:expr, $expected:expr, $($arg:tt)+) => {
        $crate::__evaluate_operands!(
            $cx, "assert_some_cast_equal", assert_some_cast_equal,
            |actual, expected| (::std::option::Option::as_ref(&actual), &expected),
            $actual, $expected, $($arg)+
        )
    };
}
