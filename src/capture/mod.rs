//! Capturing errors and published output.
//!
//! - [`TestContext::capture_error`](crate::TestContext::capture_error) and its
//!   async and completion-handler forms run an operation that is expected to
//!   fail and hand back the error. Success is recorded as an issue.
//! - [`capture_output`] and its variants subscribe to a
//!   [`Publisher`](crate::publisher::Publisher) for the duration of an action
//!   and return what was emitted.
//!
//! # Example
//!
//! ```rust
//! use tddkit::{AnyError, TestContext};
//!
//! let cx = TestContext::new("capture");
//! let error = AnyError::new();
//!
//! let captured = cx.capture_error(|| Err::<(), _>(error), "");
//! assert_eq!(captured, Some(error));
//! assert!(cx.finish().is_ok());
//! ```

mod error;
mod output;

pub use error::Completion;
pub use output::{
    capture_is_on_thread, capture_output, capture_output_async, capture_output_of,
    capture_output_of_async, DEFAULT_DROP_FIRST,
};
