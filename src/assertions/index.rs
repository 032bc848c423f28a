//! Index access that records instead of panicking.

use super::failure::Failure;
use crate::context::{Issue, Reporter, SourceLocation};

/// Bounds-checked indexing that reports out-of-range access.
///
/// # Example
///
/// ```rust
/// use tddkit::{CheckedIndex, TestContext};
///
/// let cx = TestContext::new("checked_index");
/// let messages = vec!["getUsername", "getAge"];
///
/// assert_eq!(messages.checked_index(1, &cx), Some(&"getAge"));
/// assert!(cx.finish().is_ok());
/// ```
pub trait CheckedIndex<T> {
    /// The element at `index`, or `None` after recording
    /// [`Failure::IndexOutOfRange`] on `reporter`.
    fn checked_index<R: Reporter + ?Sized>(&self, index: usize, reporter: &R) -> Option<&T>;
}

impl<T> CheckedIndex<T> for [T] {
    #[track_caller]
    fn checked_index<R: Reporter + ?Sized>(&self, index: usize, reporter: &R) -> Option<&T> {
        let element = self.get(index);
        if element.is_none() {
            reporter.record(Issue::new(
                "checked_index",
                Failure::IndexOutOfRange {
                    index,
                    len: self.len(),
                },
                "",
                SourceLocation::caller(),
            ));
        }
        element
    }
}
