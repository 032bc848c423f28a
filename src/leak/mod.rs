//! Checking at teardown that shared objects were released.
//!
//! [`TestContext::expect_deallocation`] keeps only a [`Weak`] to the subject
//! and checks it when the test finishes. A subject still reachable at that
//! point, typically because of a reference cycle, is recorded as
//! [`StillAlive`](crate::Failure::StillAlive).
//!
//! Subjects are watched through [`Arc`] only. Teardown blocks are `Send`
//! so a context can be shared with spawned tasks, which rules out [`Rc`]
//! subjects. Hold shared test subjects in `Arc` (with `Mutex` in place of
//! `RefCell`) to watch them for cycles.
//!
//! [`Rc`]: std::rc::Rc
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tddkit::TestContext;
//!
//! struct Service;
//!
//! let cx = TestContext::new("leak");
//! let service = Arc::new(Service);
//! cx.expect_deallocation(&service, "");
//! drop(service);
//!
//! assert!(cx.finish().is_ok());
//! ```

use std::any::type_name;
use std::sync::{Arc, Weak};

use crate::assertions::Failure;
use crate::context::{Issue, Reporter, SourceLocation, TestContext};

impl TestContext {
    /// Expect every strong reference to `subject` to be gone when the test finishes.
    ///
    /// Only `Arc` subjects can be watched:
    ///
    /// ```rust,compile_fail
    /// use std::rc::Rc;
    /// use tddkit::TestContext;
    ///
    /// let cx = TestContext::new("rc_subject");
    /// let subject = Rc::new(5_u8);
    /// cx.expect_deallocation(&subject, "");
    /// ```
    #[track_caller]
    pub fn expect_deallocation<T>(&self, subject: &Arc<T>, message: &str)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_sentinel(Arc::downgrade(subject), message, SourceLocation::caller());
    }

    /// Like [`expect_deallocation`](Self::expect_deallocation) for a subject
    /// only known through a weak reference.
    #[track_caller]
    pub fn expect_deallocation_of<T>(&self, subject: Weak<T>, message: &str)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_sentinel(subject, message, SourceLocation::caller());
    }

    fn register_sentinel<T>(&self, subject: Weak<T>, message: &str, location: SourceLocation)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let message = message.to_owned();
        tracing::trace!(test = %self.name(), subject = type_name::<T>(), "deallocation sentinel registered");
        self.add_teardown(move |cx| {
            // Described by type name only; the subject may be part of a cycle.
            if subject.strong_count() > 0 {
                cx.record(Issue::new(
                    "expect_deallocation",
                    Failure::StillAlive {
                        type_name: type_name::<T>(),
                    },
                    &message,
                    location,
                ));
            }
        });
    }
}
