//! Awaiting emissions as a stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures_core::Stream;
use pin_project_lite::pin_project;

use super::{Publisher, Subscription};

pin_project! {
    /// Stream of the values emitted by a publisher.
    ///
    /// Created by [`values`]. Dropping the stream cancels the subscription.
    /// The stream ends once the publisher has been dropped.
    #[must_use = "streams do nothing unless polled"]
    pub struct Values<T> {
        #[pin]
        receiver: mpsc::UnboundedReceiver<T>,
        subscription: Subscription,
    }
}

impl<T> Values<T> {
    /// The underlying subscription.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<T> Stream for Values<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.project().receiver.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.receiver.size_hint()
    }
}

impl<T> std::fmt::Debug for Values<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Values")
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

/// Subscribe to `publisher` and yield its emissions as a stream.
///
/// Values are buffered without bound until polled.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use tddkit::publisher::{values, Published};
///
/// # futures::executor::block_on(async {
/// let published = Published::new(1);
/// let mut stream = values(&published);
/// published.set(2);
///
/// assert_eq!(stream.next().await, Some(1));
/// assert_eq!(stream.next().await, Some(2));
/// # });
/// ```
pub fn values<P>(publisher: &P) -> Values<P::Output>
where
    P: Publisher + ?Sized,
    P::Output: Send + 'static,
{
    let (sender, receiver) = mpsc::unbounded();
    let subscription = publisher.subscribe(Box::new(move |value| {
        // The receiver is gone only after the stream, and with it the
        // subscription, has been dropped.
        let _ = sender.unbounded_send(value);
    }));
    Values {
        receiver,
        subscription,
    }
}
