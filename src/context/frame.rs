//! Expected-failure frames.
//!
//! A frame collects the issues recorded while its body runs. The body is
//! "running" only while it is entered on the current thread: for
//! [`TestContext::expect_failure`] that is the call itself, for the async
//! form it is each poll of the body. Issues recorded elsewhere, such as from
//! a spawned task holding a clone of the context, are not captured.
//!
//! A frame that is dropped without being closed, because its body panicked
//! or its future was dropped, hands whatever it captured back to the test.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use pin_project_lite::pin_project;

use super::{Issue, Reporter, SourceLocation, TestContext};
use crate::assertions::Failure;

static NEXT_FRAME: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// `(context, frame)` pairs entered on this thread, innermost last.
    static ENTERED: RefCell<Vec<(usize, u64)>> = const { RefCell::new(Vec::new()) };
}

pub(super) struct Frame {
    pub(super) id: u64,
    pub(super) issues: Vec<Issue>,
}

/// The innermost frame of the context keyed `key` entered on this thread.
pub(super) fn entered_frame(key: usize) -> Option<u64> {
    ENTERED.with(|entered| {
        entered
            .borrow()
            .iter()
            .rev()
            .find(|(context, _)| *context == key)
            .map(|(_, frame)| *frame)
    })
}

/// An open frame. Closing it returns the captured issues; dropping it
/// unclosed moves them to the test's issue log.
pub(super) struct FrameGuard {
    cx: TestContext,
    id: u64,
    location: SourceLocation,
    closed: bool,
}

impl FrameGuard {
    pub(super) fn open(cx: &TestContext, location: SourceLocation) -> Self {
        let id = NEXT_FRAME.fetch_add(1, Ordering::Relaxed);
        cx.inner.expected.lock().push(Frame {
            id,
            issues: Vec::new(),
        });
        Self {
            cx: cx.clone(),
            id,
            location,
            closed: false,
        }
    }

    pub(super) fn enter(&self) -> Entered {
        let key = self.cx.key();
        ENTERED.with(|entered| entered.borrow_mut().push((key, self.id)));
        Entered { id: self.id }
    }

    pub(super) fn close(mut self) -> Vec<Issue> {
        self.closed = true;
        let captured = self.take();
        if captured.is_empty() {
            self.cx.record(Issue::new(
                "expect_failure",
                Failure::ExpectedFailureMissing,
                "",
                self.location,
            ));
        }
        captured
    }

    fn take(&self) -> Vec<Issue> {
        let mut frames = self.cx.inner.expected.lock();
        frames
            .iter()
            .position(|frame| frame.id == self.id)
            .map(|index| frames.remove(index).issues)
            .unwrap_or_default()
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let abandoned = self.take();
        if abandoned.is_empty() {
            return;
        }
        tracing::warn!(
            test = %self.cx.name(),
            location = %self.location,
            issues = abandoned.len(),
            "expect_failure body did not complete; its issues fail the test"
        );
        self.cx.inner.issues.lock().extend(abandoned);
    }
}

/// Marks a frame as running on this thread until dropped.
pub(super) struct Entered {
    id: u64,
}

impl Drop for Entered {
    fn drop(&mut self) {
        ENTERED.with(|entered| {
            let mut entered = entered.borrow_mut();
            if let Some(index) = entered.iter().rposition(|(_, frame)| *frame == self.id) {
                entered.remove(index);
            }
        });
    }
}

pin_project! {
    /// Future returned by [`TestContext::expect_failure_async`].
    pub(super) struct ExpectFailure<Fut> {
        #[pin]
        body: Fut,
        frame: Option<FrameGuard>,
    }
}

impl<Fut> ExpectFailure<Fut> {
    pub(super) fn new(body: Fut, frame: FrameGuard) -> Self {
        Self {
            body,
            frame: Some(frame),
        }
    }
}

impl<Fut> Future for ExpectFailure<Fut>
where
    Fut: Future<Output = ()>,
{
    type Output = Vec<Issue>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let Some(frame) = this.frame.as_ref() else {
            panic!("expect_failure_async polled after completion");
        };

        let entered = frame.enter();
        let poll = this.body.poll(cx);
        drop(entered);

        match poll {
            Poll::Ready(()) => Poll::Ready(this.frame.take().map(FrameGuard::close).unwrap_or_default()),
            Poll::Pending => Poll::Pending,
        }
    }
}
