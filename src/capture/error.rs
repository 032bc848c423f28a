//! Turning "expected to fail" operations into captured errors.

use std::fmt;
use std::future::Future;

use futures::channel::oneshot;

use crate::assertions::Failure;
use crate::context::{Issue, Reporter, SourceLocation, TestContext};

/// Single-shot completion handler passed to callback-style operations.
///
/// Consuming [`complete`](Self::complete) guarantees it fires at most once.
/// It may be sent to and completed from any thread.
#[must_use = "the capture waits until the completion is completed or dropped"]
pub struct Completion<T, E> {
    sender: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Completion<T, E> {
    /// Deliver the outcome of the operation.
    pub fn complete(self, result: Result<T, E>) {
        if self.sender.send(result).is_err() {
            tracing::trace!("completion delivered after the capture was dropped");
        }
    }

    /// Shorthand for `complete(Ok(value))`.
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Shorthand for `complete(Err(error))`.
    pub fn fail(self, error: E) {
        self.complete(Err(error));
    }
}

impl<T, E> fmt::Debug for Completion<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("canceled", &self.sender.is_canceled())
            .finish()
    }
}

impl TestContext {
    /// Run `operation`, expecting it to fail.
    ///
    /// Returns the error. If the operation succeeds, a
    /// [`NoFailureThrown`](Failure::NoFailureThrown) issue is recorded and
    /// `None` is returned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tddkit::{FailureReason, TestContext};
    ///
    /// let cx = TestContext::new("capture_error");
    /// let issues = cx.expect_failure(|| {
    ///     let captured = cx.capture_error(|| Ok::<_, std::fmt::Error>(1), "parsing");
    ///     assert!(captured.is_none());
    /// });
    /// assert_eq!(issues[0].reason(), FailureReason::NoFailureThrown);
    /// assert_eq!(issues[0].message.as_deref(), Some("parsing"));
    /// ```
    #[track_caller]
    pub fn capture_error<T, E, F>(&self, operation: F, message: &str) -> Option<E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let location = SourceLocation::caller();
        self.settle("capture_error", operation(), message, location)
    }

    /// Await `operation`, expecting it to fail.
    ///
    /// The call site is captured when this method is called, not when the
    /// returned future completes.
    #[track_caller]
    pub fn capture_error_async<T, E, Fut>(
        &self,
        operation: Fut,
        message: &str,
    ) -> impl Future<Output = Option<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let location = SourceLocation::caller();
        let cx = self.clone();
        let message = message.to_owned();
        async move {
            let result = operation.await;
            cx.settle("capture_error_async", result, &message, location)
        }
    }

    /// Start a callback-style operation, expecting it to fail.
    ///
    /// `start` receives a [`Completion`] and must eventually complete it,
    /// from any thread. The returned future resolves once it does. A
    /// completion that is dropped without being completed records
    /// [`CompletionDropped`](Failure::CompletionDropped) and resolves to
    /// `None`; one that is kept alive and never completed leaves the caller
    /// waiting.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tddkit::{AnyError, TestContext};
    ///
    /// # futures::executor::block_on(async {
    /// let cx = TestContext::new("capture_error_completion");
    /// let error = AnyError::new();
    ///
    /// let captured = cx
    ///     .capture_error_completion(
    ///         |completion| {
    ///             std::thread::spawn(move || completion.complete(Err::<(), _>(error)));
    ///         },
    ///         "",
    ///     )
    ///     .await;
    ///
    /// assert_eq!(captured, Some(error));
    /// assert!(cx.finish().is_ok());
    /// # });
    /// ```
    #[track_caller]
    pub fn capture_error_completion<T, E, F>(
        &self,
        start: F,
        message: &str,
    ) -> impl Future<Output = Option<E>>
    where
        F: FnOnce(Completion<T, E>),
    {
        let location = SourceLocation::caller();
        let cx = self.clone();
        let message = message.to_owned();
        async move {
            let (sender, receiver) = oneshot::channel();
            start(Completion { sender });
            match receiver.await {
                Ok(result) => cx.settle("capture_error_completion", result, &message, location),
                Err(oneshot::Canceled) => {
                    cx.record(Issue::new(
                        "capture_error_completion",
                        Failure::CompletionDropped,
                        &message,
                        location,
                    ));
                    None
                }
            }
        }
    }

    fn settle<T, E>(
        &self,
        assertion: &'static str,
        result: Result<T, E>,
        message: &str,
        location: SourceLocation,
    ) -> Option<E> {
        match result {
            Ok(_) => {
                self.record(Issue::new(
                    assertion,
                    Failure::NoFailureThrown,
                    message,
                    location,
                ));
                None
            }
            Err(error) => {
                tracing::debug!(test = %self.name(), %location, "{assertion} captured an error");
                Some(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::FailureReason;
    use crate::context::ContextConfig;
    use crate::fixtures::AnyError;
    use std::time::Duration;

    fn quiet(name: &str) -> TestContext {
        TestContext::with_config(name, ContextConfig::new().quiet())
    }

    async fn fails_after_yield(error: AnyError) -> Result<u32, AnyError> {
        tokio::task::yield_now().await;
        Err(error)
    }

    async fn succeeds() -> Result<u32, AnyError> {
        Ok(3)
    }

    #[test]
    fn test_direct_form_returns_error() {
        let cx = quiet("direct");
        let error = AnyError::new();
        let captured = cx.capture_error(|| Err::<String, _>(error), "");
        assert_eq!(captured, Some(error));
        assert_eq!(cx.issue_count(), 0);
    }

    #[test]
    fn test_direct_form_success_records_one_issue() {
        let cx = quiet("direct_success");
        let captured = cx.capture_error(|| Ok::<_, AnyError>("value"), "");
        assert_eq!(captured, None);

        let issues = cx.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason(), FailureReason::NoFailureThrown);
        assert_eq!(issues[0].failure.to_string(), "should have thrown an error");
        assert!(issues[0].location.file.ends_with("error.rs"));
    }

    #[tokio::test]
    async fn test_async_form_returns_error() {
        let cx = quiet("async");
        let error = AnyError::new();
        let captured = cx.capture_error_async(fails_after_yield(error), "").await;
        assert_eq!(captured, Some(error));
        assert_eq!(cx.issue_count(), 0);
    }

    #[tokio::test]
    async fn test_async_form_success_records_with_message() {
        let cx = quiet("async_success");
        let issues = cx
            .expect_failure_async(async {
                assert!(cx.capture_error_async(succeeds(), "loading").await.is_none());
            })
            .await;

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].assertion, "capture_error_async");
        assert_eq!(issues[0].message.as_deref(), Some("loading"));
    }

    #[tokio::test]
    async fn test_completion_form_from_another_thread() {
        let cx = quiet("completion");
        let error = AnyError::new();

        let captured = cx
            .capture_error_completion(
                |completion: Completion<(), AnyError>| {
                    std::thread::spawn(move || {
                        std::thread::sleep(Duration::from_millis(5));
                        completion.fail(error);
                    });
                },
                "",
            )
            .await;

        assert_eq!(captured, Some(error));
        assert_eq!(cx.issue_count(), 0);
    }

    #[tokio::test]
    async fn test_completion_form_success() {
        let cx = quiet("completion_success");
        let captured = cx
            .capture_error_completion(|completion: Completion<u8, AnyError>| completion.succeed(1), "")
            .await;

        assert!(captured.is_none());
        let issues = cx.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason(), FailureReason::NoFailureThrown);
    }

    #[tokio::test]
    async fn test_dropped_completion_records_and_returns_none() {
        let cx = quiet("completion_dropped");
        let captured = cx
            .capture_error_completion(|completion: Completion<(), AnyError>| drop(completion), "")
            .await;

        assert!(captured.is_none());
        let issues = cx.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason(), FailureReason::CompletionDropped);
    }

    #[test]
    fn test_completion_after_capture_dropped_is_ignored() {
        let (sender, receiver) = oneshot::channel::<Result<(), AnyError>>();
        drop(receiver);
        let completion = Completion { sender };
        assert!(format!("{completion:?}").contains("canceled: true"));
        completion.fail(AnyError::new());
    }
}
