//! The reporting channel and test lifecycle.
//!
//! A [`TestContext`] plays the part of the test case: matchers record
//! [`Issue`]s on it instead of panicking, teardown blocks registered on it run
//! once when the test finishes, and [`TestContext::finish`] fails the test
//! with every issue that was collected along the way.
//!
//! # Example
//!
//! ```rust
//! use tddkit::TestContext;
//!
//! let cx = TestContext::new("example");
//! cx.assert_contains_equal(&["b", "a"], &["a", "b"], "");
//! assert!(cx.finish().is_ok());
//! ```

mod config;
mod frame;
mod issue;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::assertions::Comparison;
use crate::error::{Error, Result};

use frame::{ExpectFailure, Frame, FrameGuard};

pub use config::{ContextConfig, FAIL_FAST_ENV};
pub use issue::{Issue, IssueKind, SourceLocation};

/// A sink for recorded issues.
///
/// Every helper in this crate reports through a `Reporter` rather than a
/// global "current test". [`TestContext`] is the implementation used in tests.
pub trait Reporter {
    /// Record an issue. Must not panic unless the reporter is configured to.
    fn record(&self, issue: Issue);

    /// Record `comparison` if it failed. Returns whether it passed.
    #[track_caller]
    fn report(&self, assertion: &'static str, comparison: Comparison, message: &str) -> bool {
        match comparison {
            Ok(()) => true,
            Err(failure) => {
                self.record(Issue::new(
                    assertion,
                    failure,
                    message,
                    SourceLocation::caller(),
                ));
                false
            }
        }
    }
}

type TeardownBlock = Box<dyn FnOnce(&TestContext) + Send>;

/// Per-test state: issue log, teardown stack and expected-failure frames.
///
/// Cloning is cheap and every clone refers to the same test.
#[derive(Clone)]
pub struct TestContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    name: String,
    config: ContextConfig,
    /// Issues that will fail the test.
    issues: Mutex<Vec<Issue>>,
    /// Open `expect_failure` frames.
    expected: Mutex<Vec<Frame>>,
    teardown: Mutex<Vec<TeardownBlock>>,
    finished: AtomicBool,
}

impl TestContext {
    /// Create a context with configuration taken from the environment.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tddkit::TestContext;
    ///
    /// let cx = TestContext::new("my_test");
    /// assert_eq!(cx.name(), "my_test");
    /// assert_eq!(cx.issue_count(), 0);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, ContextConfig::from_env())
    }

    /// Create a context with an explicit configuration.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: ContextConfig) -> Self {
        let name = name.into();
        tracing::trace!(test = %name, ?config, "test context created");
        Self {
            inner: Arc::new(ContextInner {
                name,
                config,
                issues: Mutex::new(Vec::new()),
                expected: Mutex::new(Vec::new()),
                teardown: Mutex::new(Vec::new()),
                finished: AtomicBool::new(false),
            }),
        }
    }

    /// Run a synchronous test body against a fresh context, then finish it.
    ///
    /// # Panics
    ///
    /// Panics with the full report if any issue was recorded.
    pub fn run<F>(name: impl Into<String>, body: F)
    where
        F: FnOnce(&TestContext),
    {
        let cx = Self::new(name);
        body(&cx);
        cx.finish_or_panic();
    }

    /// Run an async test body against a fresh context, then finish it.
    ///
    /// # Panics
    ///
    /// Panics with the full report if any issue was recorded.
    pub async fn run_async<F, Fut>(name: impl Into<String>, body: F)
    where
        F: FnOnce(TestContext) -> Fut,
        Fut: Future<Output = ()>,
    {
        let cx = Self::new(name);
        body(cx.clone()).await;
        cx.finish_or_panic();
    }

    /// The name this context was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Snapshot of the issues that will fail the test.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        self.inner.issues.lock().clone()
    }

    /// Number of issues that will fail the test.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.inner.issues.lock().len()
    }

    /// Whether [`finish`](Self::finish) has already run the teardown blocks.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    /// Register a block to run once when the test finishes.
    ///
    /// Blocks run in reverse registration order. Independent blocks must not
    /// rely on that order.
    pub fn add_teardown<F>(&self, block: F)
    where
        F: FnOnce(&TestContext) + Send + 'static,
    {
        self.inner.teardown.lock().push(Box::new(block));
    }

    /// Run `body` expecting it to record at least one issue.
    ///
    /// Issues recorded inside `body` do not fail the test; they are returned
    /// so the caller can inspect them. If `body` records nothing, an
    /// [`ExpectedFailureMissing`](crate::Failure::ExpectedFailureMissing)
    /// issue is recorded instead.
    ///
    /// Only issues recorded on the calling thread while `body` runs are
    /// captured. If `body` panics, whatever it recorded fails the test.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tddkit::{FailureReason, TestContext};
    ///
    /// let cx = TestContext::new("expect_failure");
    /// let issues = cx.expect_failure(|| {
    ///     cx.assert_contains_equal(&["a"], &["a", "b"], "");
    /// });
    /// assert_eq!(issues[0].reason(), FailureReason::MissingElements);
    /// assert!(cx.finish().is_ok());
    /// ```
    #[track_caller]
    pub fn expect_failure<F>(&self, body: F) -> Vec<Issue>
    where
        F: FnOnce(),
    {
        let frame = FrameGuard::open(self, SourceLocation::caller());
        {
            let _entered = frame.enter();
            body();
        }
        frame.close()
    }

    /// Async form of [`expect_failure`](Self::expect_failure).
    ///
    /// Issues are captured only while `body` is being polled, so issues from
    /// tasks it spawns are not expected ones. Dropping the future before it
    /// completes, for example on a timeout, gives its captured issues back
    /// to the test.
    #[track_caller]
    pub fn expect_failure_async<Fut>(&self, body: Fut) -> impl Future<Output = Vec<Issue>>
    where
        Fut: Future<Output = ()>,
    {
        ExpectFailure::new(body, FrameGuard::open(self, SourceLocation::caller()))
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Run the teardown blocks once, then report the collected issues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IssuesRecorded`] if any unexpected issue was recorded,
    /// including issues recorded by teardown blocks.
    pub fn finish(&self) -> Result<()> {
        if !self.inner.finished.swap(true, Ordering::SeqCst) {
            self.run_teardown();
        }

        let issues = self.issues();
        if issues.is_empty() {
            tracing::debug!(test = %self.inner.name, "test finished without issues");
            return Ok(());
        }

        let report = issues
            .iter()
            .map(|issue| format!("  {issue}"))
            .collect::<Vec<_>>()
            .join("\n");
        Err(Error::issues_recorded(&self.inner.name, issues.len(), report))
    }

    /// [`finish`](Self::finish), panicking with the report on failure.
    ///
    /// # Panics
    ///
    /// Panics if any issue was recorded.
    pub fn finish_or_panic(&self) {
        if let Err(err) = self.finish() {
            panic!("{err}");
        }
    }

    fn run_teardown(&self) {
        let mut ran = 0usize;
        loop {
            // Pop under the lock, run outside it so blocks may register more.
            let Some(block) = self.inner.teardown.lock().pop() else {
                break;
            };
            block(self);
            ran += 1;
        }
        tracing::debug!(test = %self.inner.name, blocks = ran, "teardown complete");
    }
}

impl Reporter for TestContext {
    fn record(&self, issue: Issue) {
        if let Some(id) = frame::entered_frame(self.key()) {
            let mut frames = self.inner.expected.lock();
            if let Some(frame) = frames.iter_mut().find(|frame| frame.id == id) {
                tracing::debug!(
                    test = %self.inner.name,
                    location = %issue.location,
                    "expected issue: {}",
                    issue.description()
                );
                frame.issues.push(issue);
                return;
            }
        }

        if self.inner.config.log_issues {
            tracing::warn!(
                test = %self.inner.name,
                kind = %issue.kind,
                location = %issue.location,
                "{}",
                issue.description()
            );
        }

        if self.inner.config.fail_fast {
            panic!("{issue}");
        }

        self.inner.issues.lock().push(issue);
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.inner.name)
            .field("issues", &self.issue_count())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{Failure, FailureReason};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn quiet(name: &str) -> TestContext {
        TestContext::with_config(name, ContextConfig::new().quiet())
    }

    #[test]
    fn test_new_context_is_clean() {
        let cx = quiet("clean");
        assert_eq!(cx.name(), "clean");
        assert_eq!(cx.issue_count(), 0);
        assert!(!cx.is_finished());
        assert!(cx.finish().is_ok());
        assert!(cx.is_finished());
    }

    #[test]
    fn test_report_records_only_failures() {
        let cx = quiet("report");
        assert!(cx.report("check", Ok(()), ""));
        assert!(!cx.report("check", Err(Failure::NilValue), "label"));

        let issues = cx.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason(), FailureReason::NilValue);
        assert_eq!(issues[0].message.as_deref(), Some("label"));
        assert!(issues[0].location.file.ends_with("mod.rs"));
    }

    #[test]
    fn test_multiple_issues_are_all_collected() {
        let cx = quiet("collect");
        cx.report("first", Err(Failure::NilValue), "");
        cx.report("second", Err(Failure::NoFailureThrown), "");

        let err = cx.finish().unwrap_err();
        assert_eq!(err.issue_count(), 2);
        let text = err.to_string();
        assert!(text.contains("first failed"));
        assert!(text.contains("second failed"));
    }

    #[test]
    fn test_teardown_runs_once_in_reverse_order() {
        let cx = quiet("teardown");
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            cx.add_teardown(move |_| order.lock().push(i));
        }

        assert!(cx.finish().is_ok());
        assert!(cx.finish().is_ok());
        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[test]
    fn test_teardown_can_record() {
        let cx = quiet("teardown_record");
        cx.add_teardown(|cx| {
            cx.report("late", Err(Failure::NilValue), "");
        });

        assert!(cx.finish().is_err());
        assert_eq!(cx.issue_count(), 1);
    }

    #[test]
    fn test_teardown_registered_during_teardown_runs() {
        let cx = quiet("nested_teardown");
        let runs = Arc::new(AtomicUsize::new(0));
        let outer = Arc::clone(&runs);
        cx.add_teardown(move |cx| {
            outer.fetch_add(1, Ordering::SeqCst);
            let inner = Arc::clone(&outer);
            cx.add_teardown(move |_| {
                inner.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert!(cx.finish().is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expect_failure_captures_issues() {
        let cx = quiet("expect");
        let issues = cx.expect_failure(|| {
            cx.report("inside", Err(Failure::NilValue), "");
        });

        assert_eq!(issues.len(), 1);
        assert_eq!(cx.issue_count(), 0);
        assert!(cx.finish().is_ok());
    }

    #[test]
    fn test_expect_failure_without_failure_records() {
        let cx = quiet("expect_missing");
        let issues = cx.expect_failure(|| {});

        assert!(issues.is_empty());
        let recorded = cx.issues();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].reason(), FailureReason::ExpectedFailureMissing);
    }

    #[test]
    fn test_nested_expect_failure() {
        let cx = quiet("nested_expect");
        let outer = cx.expect_failure(|| {
            let inner = cx.expect_failure(|| {});
            assert!(inner.is_empty());
        });

        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].reason(), FailureReason::ExpectedFailureMissing);
        assert_eq!(cx.issue_count(), 0);
    }

    #[tokio::test]
    async fn test_expect_failure_async() {
        let cx = quiet("expect_async");
        let issues = cx
            .expect_failure_async(async {
                tokio::task::yield_now().await;
                cx.report("inside", Err(Failure::NoFailureThrown), "");
            })
            .await;

        assert_eq!(issues.len(), 1);
        assert!(cx.finish().is_ok());
    }

    fn reasons(cx: &TestContext) -> Vec<FailureReason> {
        cx.issues().iter().map(Issue::reason).collect()
    }

    #[test]
    fn test_panicking_expect_failure_body_keeps_later_issues() {
        let cx = quiet("expect_panicked");
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            cx.expect_failure(|| {
                cx.report("inside", Err(Failure::NilValue), "");
                panic!("body panicked");
            })
        }));
        assert!(outcome.is_err());

        cx.report("later", Err(Failure::NoFailureThrown), "");

        assert_eq!(
            reasons(&cx),
            vec![FailureReason::NilValue, FailureReason::NoFailureThrown]
        );
        assert!(cx.finish().is_err());
    }

    #[tokio::test]
    async fn test_dropped_expect_failure_async_keeps_later_issues() {
        let cx = quiet("expect_dropped");
        let body = cx.expect_failure_async(async {
            cx.report("inside", Err(Failure::NilValue), "");
            std::future::pending::<()>().await;
        });
        let outcome = tokio::time::timeout(Duration::from_millis(5), body).await;
        assert!(outcome.is_err());

        cx.report("later", Err(Failure::NoFailureThrown), "");

        assert_eq!(
            reasons(&cx),
            vec![FailureReason::NilValue, FailureReason::NoFailureThrown]
        );
        assert!(cx.finish().is_err());
    }

    #[tokio::test]
    async fn test_expect_failure_async_ignores_spawned_task_issues() {
        let cx = quiet("expect_spawned");
        let other = cx.clone();
        let issues = cx
            .expect_failure_async(async {
                tokio::spawn(async move {
                    other.report("spawned", Err(Failure::NilValue), "");
                })
                .await
                .unwrap();
                cx.report("inside", Err(Failure::NoFailureThrown), "");
            })
            .await;

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].assertion, "inside");

        let recorded = cx.issues();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].assertion, "spawned");
    }

    #[test]
    fn test_expect_failure_ignores_other_thread_issues() {
        let cx = quiet("expect_thread");
        let issues = cx.expect_failure(|| {
            let other = cx.clone();
            std::thread::spawn(move || {
                other.report("thread", Err(Failure::NilValue), "");
            })
            .join()
            .unwrap();
            cx.report("inside", Err(Failure::NoFailureThrown), "");
        });

        assert_eq!(issues.len(), 1);
        assert_eq!(reasons(&cx), vec![FailureReason::NilValue]);
    }

    #[test]
    fn test_expect_failure_scoped_per_context() {
        let cx = quiet("expect_outer");
        let unrelated = quiet("expect_unrelated");
        let issues = cx.expect_failure(|| {
            unrelated.report("unrelated", Err(Failure::NilValue), "");
            cx.report("inside", Err(Failure::NoFailureThrown), "");
        });

        assert_eq!(issues.len(), 1);
        assert_eq!(cx.issue_count(), 0);
        assert_eq!(unrelated.issue_count(), 1);
    }

    #[test]
    #[should_panic(expected = "first value was nil")]
    fn test_fail_fast_panics_on_record() {
        let cx = TestContext::with_config("fail_fast", ContextConfig::new().quiet().fail_fast());
        cx.report("check", Err(Failure::NilValue), "");
    }

    #[test]
    #[should_panic(expected = "1 issue(s) recorded in run_helper")]
    fn test_run_panics_with_report() {
        TestContext::run("run_helper", |cx| {
            cx.report("check", Err(Failure::NilValue), "");
        });
    }

    #[tokio::test]
    async fn test_run_async_passes() {
        TestContext::run_async("run_async_helper", |cx| async move {
            assert!(cx.report("check", Ok(()), ""));
        })
        .await;
    }

    #[test]
    fn test_context_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TestContext>();
    }
}
