//! Push sources that tests can subscribe to.
//!
//! A [`Publisher`] delivers values to subscribed sinks until the returned
//! [`Subscription`] is cancelled or dropped. Two implementations are provided:
//!
//! - [`PassthroughSubject`] forwards every sent value to the current
//!   subscribers and replays nothing.
//! - [`Published`] holds a current value; a new subscriber receives it
//!   immediately, then every later change. Changes are stored before they
//!   are emitted, so a sink that reads the value back sees the new state.
//!
//! [`values`] adapts any publisher into a [`Stream`](futures_core::Stream).
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use tddkit::publisher::{Published, Publisher};
//!
//! let state = Published::new(false);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let subscription = state.subscribe(Box::new(move |value| sink.lock().push(value)));
//! state.set(true);
//! subscription.cancel();
//! state.set(false);
//!
//! assert_eq!(*seen.lock(), vec![false, true]);
//! ```

mod subject;
mod values;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

pub use subject::{PassthroughSubject, Published};
pub use values::{values, Values};

/// A subscriber callback.
///
/// A sink may be called from any thread, but never concurrently with itself.
/// It must not emit synchronously on the publisher it is subscribed to.
pub type Sink<T> = Box<dyn FnMut(T) + Send>;

/// A producer that delivers values to subscribers until cancelled.
pub trait Publisher {
    /// The type of emitted values.
    type Output;

    /// Start delivering values to `sink`.
    ///
    /// Delivery stops when the returned subscription is cancelled or dropped.
    fn subscribe(&self, sink: Sink<Self::Output>) -> Subscription;
}

type CancelFn = Box<dyn FnOnce() + Send>;

/// Handle to a live subscription.
///
/// Cancelling is idempotent, and dropping the handle cancels it.
#[must_use = "dropping a subscription cancels it"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    on_cancel: Mutex<Option<CancelFn>>,
}

impl Subscription {
    /// Create an active subscription that runs `on_cancel` once when cancelled.
    ///
    /// Used by [`Publisher`] implementations outside this crate.
    pub fn new<F>(on_cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            active: Arc::new(AtomicBool::new(true)),
            on_cancel: Mutex::new(Some(Box::new(on_cancel))),
        }
    }

    /// Stop delivery. Later calls do nothing.
    pub fn cancel(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            let on_cancel = self.on_cancel.lock().take();
            if let Some(on_cancel) = on_cancel {
                on_cancel();
            }
            tracing::trace!("subscription cancelled");
        }
    }

    /// Whether values are still being delivered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Shared flag that turns false when this subscription is cancelled.
    pub(crate) fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
