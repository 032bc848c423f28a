//! Unwrap, downcast, then compare.
//!
//! Errors and other values often reach a test behind a wide type such as
//! `Box<dyn Error + Send + Sync>` or `Box<dyn Any>`. The helpers here check,
//! in order, that the value is present, that it downcasts to the expected
//! concrete type, and that it equals the expected value. Only the first
//! failing step is reported.

use std::any::{type_name, Any};
use std::error::Error as StdError;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::Arc;

use super::failure::{Comparison, Failure};
use crate::context::{Reporter, TestContext};
use crate::error::BoxError;

/// A value that can be viewed as a concrete `T` at runtime.
///
/// Implemented for the erased `dyn Any` and `dyn Error` families and
/// transparently through `&`, `Box`, `Rc` and `Arc`.
pub trait Downcast<T> {
    /// Borrow the value as `T` if that is its concrete type.
    fn downcast_to(&self) -> Option<&T>;
}

macro_rules! impl_downcast_any {
    ($($ty:ty),+ $(,)?) => {$(
        impl<T: Any> Downcast<T> for $ty {
            fn downcast_to(&self) -> Option<&T> {
                self.downcast_ref::<T>()
            }
        }
    )+};
}

macro_rules! impl_downcast_error {
    ($($ty:ty),+ $(,)?) => {$(
        impl<T: StdError + 'static> Downcast<T> for $ty {
            fn downcast_to(&self) -> Option<&T> {
                self.downcast_ref::<T>()
            }
        }
    )+};
}

impl_downcast_any!(dyn Any, dyn Any + Send, dyn Any + Send + Sync);
impl_downcast_error!(
    dyn StdError + 'static,
    dyn StdError + Send + 'static,
    dyn StdError + Send + Sync + 'static,
);

impl<T, V: Downcast<T> + ?Sized> Downcast<T> for &V {
    fn downcast_to(&self) -> Option<&T> {
        <V as Downcast<T>>::downcast_to(&**self)
    }
}

impl<T, V: Downcast<T> + ?Sized> Downcast<T> for Box<V> {
    fn downcast_to(&self) -> Option<&T> {
        <V as Downcast<T>>::downcast_to(&**self)
    }
}

impl<T, V: Downcast<T> + ?Sized> Downcast<T> for Rc<V> {
    fn downcast_to(&self) -> Option<&T> {
        <V as Downcast<T>>::downcast_to(&**self)
    }
}

impl<T, V: Downcast<T> + ?Sized> Downcast<T> for Arc<V> {
    fn downcast_to(&self) -> Option<&T> {
        <V as Downcast<T>>::downcast_to(&**self)
    }
}

/// Downcast `actual` to `T` and compare it with `expected`.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
/// use tddkit::assertions::compare_cast;
/// use tddkit::FailureReason;
///
/// let value: Box<dyn Any> = Box::new(7_u32);
/// assert!(compare_cast(&value, &7_u32).is_ok());
/// assert_eq!(compare_cast(&value, &7_i64).unwrap_err().reason(), FailureReason::CastFailure);
/// ```
pub fn compare_cast<V, T>(actual: &V, expected: &T) -> Comparison
where
    V: Downcast<T> + ?Sized,
    T: PartialEq + Debug,
{
    let Some(cast) = <V as Downcast<T>>::downcast_to(actual) else {
        return Err(Failure::CastFailure {
            from: type_name::<V>(),
            to: type_name::<T>(),
        });
    };

    if cast == expected {
        Ok(())
    } else {
        Err(Failure::not_equal(cast, expected))
    }
}

/// Like [`compare_cast`], failing with [`Failure::NilValue`] when `actual` is `None`.
pub fn compare_some_cast<V, T>(actual: Option<&V>, expected: &T) -> Comparison
where
    V: Downcast<T> + ?Sized,
    T: PartialEq + Debug,
{
    match actual {
        Some(value) => compare_cast(value, expected),
        None => Err(Failure::NilValue),
    }
}

impl TestContext {
    /// Assert that `actual` downcasts to `T` and equals `expected`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tddkit::{AnyError, BoxError, TestContext};
    ///
    /// let cx = TestContext::new("cast_equal");
    /// let error = AnyError::new();
    /// let captured: BoxError = Box::new(error);
    ///
    /// cx.assert_cast_equal(&captured, &error, "");
    /// assert!(cx.finish().is_ok());
    /// ```
    #[track_caller]
    pub fn assert_cast_equal<V, T>(&self, actual: &V, expected: &T, message: &str)
    where
        V: Downcast<T> + ?Sized,
        T: PartialEq + Debug,
    {
        self.report("assert_cast_equal", compare_cast(actual, expected), message);
    }

    /// Assert that `actual` is present, downcasts to `T` and equals `expected`.
    #[track_caller]
    pub fn assert_some_cast_equal<V, T>(&self, actual: Option<&V>, expected: &T, message: &str)
    where
        V: Downcast<T> + ?Sized,
        T: PartialEq + Debug,
    {
        self.report(
            "assert_some_cast_equal",
            compare_some_cast(actual, expected),
            message,
        );
    }

    /// Record that evaluating an operand of `assertion` failed with `error`.
    ///
    /// Used by the assertion macros when an operand expression returns `Err`.
    #[track_caller]
    pub fn record_thrown(&self, assertion: &'static str, error: &BoxError, message: &str) {
        self.report(assertion, Err(Failure::thrown(error)), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::FailureReason;
    use crate::context::ContextConfig;
    use crate::fixtures::AnyError;

    #[derive(Debug, PartialEq)]
    struct OtherError;

    impl std::fmt::Display for OtherError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "other")
        }
    }

    impl StdError for OtherError {}

    fn boxed(error: impl StdError + Send + Sync + 'static) -> BoxError {
        Box::new(error)
    }

    #[test]
    fn test_successful_cast() {
        let error = AnyError::new();
        let captured: Option<BoxError> = Some(boxed(error));
        assert!(compare_some_cast(captured.as_ref(), &error).is_ok());
    }

    #[test]
    fn test_nil_value() {
        let captured: Option<BoxError> = None;
        let failure = compare_some_cast(captured.as_ref(), &AnyError::new()).unwrap_err();
        assert_eq!(failure, Failure::NilValue);
    }

    #[test]
    fn test_wrong_type() {
        let captured = boxed(OtherError);
        let failure = compare_cast(&captured, &AnyError::new()).unwrap_err();
        assert_eq!(failure.reason(), FailureReason::CastFailure);
        let text = failure.to_string();
        assert!(text.contains("Box<dyn "), "{text}");
        assert!(text.contains("error::Error"), "{text}");
        assert!(text.contains("AnyError"), "{text}");
    }

    #[test]
    fn test_same_type_not_equal() {
        let captured = boxed(AnyError::new());
        let failure = compare_cast(&captured, &AnyError::new()).unwrap_err();
        assert_eq!(failure.reason(), FailureReason::NotEqual);
        assert!(failure.to_string().contains(" != "));
    }

    #[test]
    fn test_any_values() {
        let value: Box<dyn Any + Send> = Box::new(String::from("text"));
        assert!(compare_cast(&value, &String::from("text")).is_ok());
        assert_eq!(
            compare_cast(&value, &"text").unwrap_err().reason(),
            FailureReason::CastFailure
        );

        let shared: Arc<dyn Any + Send + Sync> = Arc::new(3_u8);
        assert!(compare_cast(&shared, &3_u8).is_ok());
    }

    #[test]
    fn test_through_references() {
        let error = AnyError::new();
        let captured = boxed(error);
        let borrowed = Some(&captured);
        assert!(compare_some_cast(borrowed.as_ref(), &error).is_ok());
    }

    #[test]
    fn test_assert_some_cast_equal_reports_each_cause() {
        let cx = TestContext::with_config("cast", ContextConfig::new().quiet());
        let error = AnyError::new();
        let none: Option<BoxError> = None;
        let other = Some(boxed(OtherError));
        let unequal = Some(boxed(AnyError::new()));

        let issues = cx.expect_failure(|| {
            cx.assert_some_cast_equal(none.as_ref(), &error, "");
            cx.assert_some_cast_equal(other.as_ref(), &error, "");
            cx.assert_some_cast_equal(unequal.as_ref(), &error, "");
        });

        let reasons: Vec<_> = issues.iter().map(|issue| issue.reason()).collect();
        assert_eq!(
            reasons,
            vec![
                FailureReason::NilValue,
                FailureReason::CastFailure,
                FailureReason::NotEqual
            ]
        );
        assert_eq!(cx.issue_count(), 0);
    }

    #[test]
    fn test_record_thrown_is_thrown_error_kind() {
        let cx = TestContext::with_config("thrown", ContextConfig::new().quiet());
        let error: BoxError = Box::new(AnyError::new());
        let issues = cx.expect_failure(|| cx.record_thrown("assert_cast_equal", &error, ""));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, crate::context::IssueKind::ThrownError);
        assert!(issues[0].description().contains("threw error"));
    }
}
