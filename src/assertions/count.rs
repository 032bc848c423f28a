//! Ordered equality that reports length mismatches separately.

use std::fmt::Debug;

use super::failure::{Comparison, Failure};
use crate::context::{Reporter, TestContext};

/// Compare two collections element by element, checking their lengths first.
///
/// # Example
///
/// ```rust
/// use tddkit::assertions::compare_count;
/// use tddkit::FailureReason;
///
/// assert!(compare_count(&[1, 2], &[1, 2]).is_ok());
/// assert_eq!(compare_count(&[1], &[1, 2]).unwrap_err().reason(), FailureReason::CountMismatch);
/// assert_eq!(compare_count(&[2, 1], &[1, 2]).unwrap_err().reason(), FailureReason::NotEqual);
/// ```
pub fn compare_count<T: PartialEq + Debug>(actual: &[T], expected: &[T]) -> Comparison {
    if actual.len() != expected.len() {
        return Err(Failure::CountMismatch {
            actual_count: actual.len(),
            expected_count: expected.len(),
            actual: format!("{actual:?}"),
            expected: format!("{expected:?}"),
        });
    }

    if actual == expected {
        Ok(())
    } else {
        Err(Failure::not_equal(actual, expected))
    }
}

impl TestContext {
    /// Assert that two collections are equal, reporting a count mismatch first.
    #[track_caller]
    pub fn assert_count_equal<T: PartialEq + Debug>(&self, actual: &[T], expected: &[T], message: &str) {
        self.report("assert_count_equal", compare_count(actual, expected), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::FailureReason;
    use crate::context::ContextConfig;

    #[test]
    fn test_equal_collections_pass() {
        assert!(compare_count(&["Loading...", "Finished"], &["Loading...", "Finished"]).is_ok());
        assert!(compare_count::<u8>(&[], &[]).is_ok());
    }

    #[test]
    fn test_count_mismatch_detail() {
        let failure = compare_count(&["a"], &["a", "b"]).unwrap_err();
        assert_eq!(
            failure.to_string(),
            "count (1) is not equal to (2) for [\"a\"] and [\"a\", \"b\"]"
        );
    }

    #[test]
    fn test_same_count_different_order_is_not_equal() {
        let failure = compare_count(&["b", "a"], &["a", "b"]).unwrap_err();
        assert_eq!(failure.reason(), FailureReason::NotEqual);
        assert_eq!(failure.to_string(), "[\"b\", \"a\"] != [\"a\", \"b\"]");
    }

    #[test]
    fn test_assert_count_equal_records() {
        let cx = TestContext::with_config("count", ContextConfig::new().quiet());
        let issues = cx.expect_failure(|| cx.assert_count_equal(&[1, 2, 3], &[1, 2], ""));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason(), FailureReason::CountMismatch);
    }
}
