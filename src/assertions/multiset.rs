//! Order-independent, duplicate-sensitive collection comparison.

use std::fmt::Debug;

use super::failure::{Comparison, Failure};
use crate::context::{Reporter, TestContext};

/// Elements left unmatched after pairing two collections element by element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisetDiff<T> {
    /// Elements of the expected collection with no counterpart in the actual one.
    pub missing: Vec<T>,
    /// Elements of the actual collection with no counterpart in the expected one.
    pub extra: Vec<T>,
}

impl<T> MultisetDiff<T> {
    /// Whether both collections hold the same multiset of elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compute the multiset difference between `actual` and `expected`.
///
/// Each element is consumed at most once, so `["a", "a"]` against `["a"]`
/// leaves one extra `"a"`. Both directions are computed independently and
/// keep the order in which unmatched elements appear in their own collection.
///
/// # Example
///
/// ```rust
/// use tddkit::assertions::multiset_difference;
///
/// let diff = multiset_difference(&["one", "three", "four"], &["one", "two", "three"]);
/// assert_eq!(diff.missing, vec![&"two"]);
/// assert_eq!(diff.extra, vec![&"four"]);
/// ```
pub fn multiset_difference<'a, T: PartialEq>(actual: &'a [T], expected: &'a [T]) -> MultisetDiff<&'a T> {
    MultisetDiff {
        missing: unmatched(expected, actual),
        extra: unmatched(actual, expected),
    }
}

/// Elements of `from` left over after removing the first match of each element of `by`.
fn unmatched<'a, T: PartialEq>(from: &'a [T], by: &[T]) -> Vec<&'a T> {
    let mut remaining: Vec<&T> = from.iter().collect();
    for element in by {
        if let Some(index) = remaining.iter().position(|candidate| *candidate == element) {
            remaining.remove(index);
        }
    }
    remaining
}

/// Compare two collections as multisets.
///
/// # Example
///
/// ```rust
/// use tddkit::assertions::compare_contains;
/// use tddkit::FailureReason;
///
/// assert!(compare_contains(&[3, 1, 2], &[1, 2, 3]).is_ok());
///
/// let failure = compare_contains(&["one", "three"], &["one", "two", "three"]).unwrap_err();
/// assert_eq!(failure.reason(), FailureReason::MissingElements);
/// assert!(failure.to_string().contains("two"));
/// ```
pub fn compare_contains<T: PartialEq + Debug>(actual: &[T], expected: &[T]) -> Comparison {
    let diff = multiset_difference(actual, expected);
    let missing = render(&diff.missing);
    let extra = render(&diff.extra);

    match (missing.is_empty(), extra.is_empty()) {
        (true, true) => Ok(()),
        (false, true) => Err(Failure::MissingElements(missing)),
        (true, false) => Err(Failure::ExtraElements(extra)),
        (false, false) => Err(Failure::MissingAndExtra { missing, extra }),
    }
}

fn render<T: Debug>(elements: &[&T]) -> Vec<String> {
    elements.iter().map(|element| format!("{element:?}")).collect()
}

impl TestContext {
    /// Assert that two collections hold the same elements, in any order.
    ///
    /// Records a single issue listing every missing and extra element.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tddkit::TestContext;
    ///
    /// let cx = TestContext::new("contains_equal");
    /// cx.assert_contains_equal(&["getAge", "getUsername"], &["getUsername", "getAge"], "");
    /// assert!(cx.finish().is_ok());
    /// ```
    #[track_caller]
    pub fn assert_contains_equal<T: PartialEq + Debug>(&self, actual: &[T], expected: &[T], message: &str) {
        self.report(
            "assert_contains_equal",
            compare_contains(actual, expected),
            message,
        );
    }
}
