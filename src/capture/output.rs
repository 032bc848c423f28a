//! Sampling what a publisher emits while an action runs.
//!
//! Every variant subscribes before the action starts, drops the first
//! `drop_first` emissions, records the rest and cancels the subscription as
//! soon as the action returns. The subscription is an RAII guard, so it is
//! also cancelled if the action panics or the capture future is dropped.
//! Emissions that arrive after cancellation are ignored.
//!
//! # Drop count
//!
//! [`DEFAULT_DROP_FIRST`] is 1: a [`Published`](crate::publisher::Published)
//! value replays its current value on subscription, and that replay is
//! usually not what a test wants to see. Publishers in this crate store a
//! change before emitting it, so [`capture_output_of`] reads the new state
//! during each emission. Pass a different count for publishers that emit
//! before storing.

use std::future::Future;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::publisher::{Publisher, Subscription};

/// Number of initial emissions dropped unless a test asks otherwise.
pub const DEFAULT_DROP_FIRST: usize = 1;

/// Append-only log written from the subscription's sink.
struct SampleLog<O> {
    state: Mutex<LogState<O>>,
}

struct LogState<O> {
    to_drop: usize,
    sealed: bool,
    entries: Vec<O>,
}

impl<O> SampleLog<O> {
    fn new(drop_first: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LogState {
                to_drop: drop_first,
                sealed: false,
                entries: Vec::new(),
            }),
        })
    }

    /// Count one emission, recording `sample()` if it qualifies.
    fn observe(&self, sample: impl FnOnce() -> O) {
        let mut state = self.state.lock();
        if state.sealed {
            return;
        }
        if state.to_drop > 0 {
            state.to_drop -= 1;
            return;
        }
        state.entries.push(sample());
    }

    /// Stop recording and return what was captured.
    fn seal(&self) -> Vec<O> {
        let mut state = self.state.lock();
        state.sealed = true;
        std::mem::take(&mut state.entries)
    }
}

/// Subscribes `sample` to `publisher`, returning the guard and the log.
fn start<P, O, S>(publisher: &P, drop_first: usize, mut sample: S) -> (Subscription, Arc<SampleLog<O>>)
where
    P: Publisher + ?Sized,
    O: Send + 'static,
    S: FnMut(P::Output) -> O + Send + 'static,
{
    let log = SampleLog::new(drop_first);
    let sink_log = Arc::clone(&log);
    let subscription = publisher.subscribe(Box::new(move |value| {
        sink_log.observe(|| sample(value));
    }));
    tracing::trace!(drop_first, "output capture started");
    (subscription, log)
}

fn stop<O>(subscription: &Subscription, log: &SampleLog<O>) -> Vec<O> {
    subscription.cancel();
    let entries = log.seal();
    tracing::debug!(samples = entries.len(), "output capture finished");
    entries
}

/// Collect the values `publisher` emits while `action` runs.
///
/// # Example
///
/// ```rust
/// use tddkit::capture::{capture_output, DEFAULT_DROP_FIRST};
/// use tddkit::publisher::Published;
///
/// let is_loading = Published::new(false);
/// let output = capture_output(&is_loading, DEFAULT_DROP_FIRST, || {
///     is_loading.set(true);
///     is_loading.set(false);
/// });
/// assert_eq!(output, vec![true, false]);
/// ```
pub fn capture_output<P, F>(publisher: &P, drop_first: usize, action: F) -> Vec<P::Output>
where
    P: Publisher + ?Sized,
    P::Output: Send + 'static,
    F: FnOnce(),
{
    let (subscription, log) = start(publisher, drop_first, |value| value);
    action();
    stop(&subscription, &log)
}

/// Async form of [`capture_output`]; the subscription lives until `action` completes.
pub async fn capture_output_async<P, Fut>(publisher: &P, drop_first: usize, action: Fut) -> Vec<P::Output>
where
    P: Publisher + ?Sized,
    P::Output: Send + 'static,
    Fut: Future<Output = ()>,
{
    let (subscription, log) = start(publisher, drop_first, |value| value);
    action.await;
    stop(&subscription, &log)
}

/// Sample `read` on every qualifying emission of `publisher`, then once more
/// after `action` returns.
///
/// Useful for observing a property that changes together with the published
/// value rather than the value itself.
///
/// # Example
///
/// ```rust
/// use tddkit::capture::capture_output_of;
/// use tddkit::publisher::Published;
///
/// let is_loading = Published::new(false);
/// let reader = is_loading.clone();
/// let text = capture_output_of(
///     move || if reader.get() { "Loading..." } else { "Finished" },
///     &is_loading,
///     1,
///     || {
///         is_loading.set(true);
///         is_loading.set(false);
///     },
/// );
/// assert_eq!(text, vec!["Loading...", "Finished", "Finished"]);
/// ```
pub fn capture_output_of<R, O, P, F>(read: R, publisher: &P, drop_first: usize, action: F) -> Vec<O>
where
    R: Fn() -> O + Send + Sync + 'static,
    O: Send + 'static,
    P: Publisher + ?Sized,
    F: FnOnce(),
{
    let read = Arc::new(read);
    let sink_read = Arc::clone(&read);
    let (subscription, log) = start(publisher, drop_first, move |_| sink_read());
    action();
    let mut entries = stop(&subscription, &log);
    entries.push(read());
    entries
}

/// Async form of [`capture_output_of`].
pub async fn capture_output_of_async<R, O, P, Fut>(
    read: R,
    publisher: &P,
    drop_first: usize,
    action: Fut,
) -> Vec<O>
where
    R: Fn() -> O + Send + Sync + 'static,
    O: Send + 'static,
    P: Publisher + ?Sized,
    Fut: Future<Output = ()>,
{
    let read = Arc::new(read);
    let sink_read = Arc::clone(&read);
    let (subscription, log) = start(publisher, drop_first, move |_| sink_read());
    action.await;
    let mut entries = stop(&subscription, &log);
    entries.push(read());
    entries
}

/// Record, for every qualifying emission, whether it was delivered on the
/// thread identified by `thread_id`.
///
/// # Example
///
/// ```rust
/// use tddkit::capture::capture_is_on_thread;
/// use tddkit::publisher::PassthroughSubject;
///
/// let subject = PassthroughSubject::new();
/// let main = std::thread::current().id();
///
/// let on_main = capture_is_on_thread(main, &subject, 0, || {
///     subject.send(());
///     let subject = subject.clone();
///     std::thread::spawn(move || subject.send(())).join().unwrap();
/// });
/// assert_eq!(on_main, vec![true, false]);
/// ```
pub fn capture_is_on_thread<P, F>(thread_id: ThreadId, publisher: &P, drop_first: usize, action: F) -> Vec<bool>
where
    P: Publisher + ?Sized,
    F: FnOnce(),
{
    let (subscription, log) = start(publisher, drop_first, move |_| thread::current().id() == thread_id);
    action();
    stop(&subscription, &log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{PassthroughSubject, Published};

    #[test]
    fn test_drop_one_then_two_emissions_keeps_second() {
        let subject = PassthroughSubject::new();
        let output = capture_output(&subject, 1, || {
            subject.send("first");
            subject.send("second");
        });
        assert_eq!(output, vec!["second"]);
    }

    #[test]
    fn test_default_drop_skips_replayed_value() {
        let published = Published::new(0);
        let output = capture_output(&published, DEFAULT_DROP_FIRST, || {
            published.set(1);
            published.set(2);
        });
        assert_eq!(output, vec![1, 2]);
    }

    #[test]
    fn test_no_emissions_after_action() {
        let subject = PassthroughSubject::new();
        let output = capture_output(&subject, 0, || subject.send(1));
        subject.send(2);

        assert_eq!(output, vec![1]);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_more_than_emitted() {
        let subject = PassthroughSubject::new();
        let output = capture_output(&subject, 5, || subject.send(1));
        assert!(output.is_empty());
    }

    #[test]
    fn test_panicking_action_cancels_subscription() {
        let subject = PassthroughSubject::<u8>::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            capture_output(&subject, 0, || panic!("action failed"));
        }));

        assert!(result.is_err());
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn test_output_of_samples_after_store() {
        let published = Published::new(0);
        let reader = published.clone();
        let doubled = capture_output_of(move || reader.get() * 2, &published, 1, || {
            published.set(1);
            published.set(2);
        });
        assert_eq!(doubled, vec![2, 4, 4]);
    }

    #[test]
    fn test_output_of_without_emissions_reads_final_state() {
        let subject = PassthroughSubject::<()>::new();
        let output = capture_output_of(|| "final", &subject, 0, || {});
        assert_eq!(output, vec!["final"]);
    }

    #[test]
    fn test_sealed_log_ignores_late_samples() {
        let log = SampleLog::new(0);
        log.observe(|| 1);
        assert_eq!(log.seal(), vec![1]);
        log.observe(|| 2);
        assert!(log.seal().is_empty());
    }

    #[test]
    fn test_is_on_thread() {
        let published = Published::new(0);
        let here = thread::current().id();

        let on_thread = capture_is_on_thread(here, &published, DEFAULT_DROP_FIRST, || {
            published.set(1);
            let remote = published.clone();
            thread::spawn(move || remote.set(2)).join().unwrap();
        });
        assert_eq!(on_thread, vec![true, false]);
    }

    #[tokio::test]
    async fn test_async_capture_spans_awaits() {
        let published = Published::new(String::new());
        let writer = published.clone();

        let output = capture_output_async(&published, 1, async move {
            writer.set("Loading...".into());
            tokio::task::yield_now().await;
            writer.set("Finished".into());
        })
        .await;
        assert_eq!(output, vec!["Loading...", "Finished"]);
    }

    #[tokio::test]
    async fn test_async_capture_from_spawned_task() {
        let published = Published::new(false);
        let writer = published.clone();

        let output = capture_output_async(&published, 1, async move {
            tokio::spawn(async move { writer.set(true) }).await.unwrap();
        })
        .await;
        assert_eq!(output, vec![true]);
    }

    #[tokio::test]
    async fn test_async_output_of() {
        let published = Published::new(1);
        let reader = published.clone();
        let writer = published.clone();

        let output = capture_output_of_async(move || reader.get() + 100, &published, 1, async move {
            writer.set(2);
        })
        .await;
        assert_eq!(output, vec![102, 102]);
    }
}
