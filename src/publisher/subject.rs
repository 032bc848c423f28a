//! In-memory publishers.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

use super::{Publisher, Sink, Subscription};

/// A registered sink.
struct Slot<T> {
    id: u64,
    /// Shared with the [`Subscription`]; checked under the sink lock.
    active: Arc<AtomicBool>,
    sink: Mutex<Sink<T>>,
}

impl<T> Slot<T> {
    fn deliver(&self, value: T) {
        let mut sink = self.sink.lock();
        if self.active.load(Ordering::SeqCst) {
            (*sink)(value);
        }
    }
}

/// The subscriber list shared by every subject.
struct Subscribers<T> {
    next_id: AtomicU64,
    slots: Mutex<Vec<Arc<Slot<T>>>>,
}

impl<T: Clone + Send + 'static> Subscribers<T> {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            slots: Mutex::new(Vec::new()),
        })
    }

    fn register(self: &Arc<Self>, sink: Sink<T>) -> (Subscription, Arc<Slot<T>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let list: Weak<Self> = Arc::downgrade(self);
        let subscription = Subscription::new(move || {
            if let Some(list) = list.upgrade() {
                list.slots.lock().retain(|slot| slot.id != id);
            }
        });

        let slot = Arc::new(Slot {
            id,
            active: subscription.active_flag(),
            sink: Mutex::new(sink),
        });
        self.slots.lock().push(Arc::clone(&slot));
        tracing::trace!(subscriber = id, "subscriber registered");
        (subscription, slot)
    }

    fn send(&self, value: &T) {
        // Snapshot so sinks run without the list lock held.
        let slots = self.slots.lock().clone();
        for slot in slots {
            slot.deliver(value.clone());
        }
    }

    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

/// A publisher that forwards sent values to its current subscribers.
///
/// Nothing is replayed: a subscriber only sees values sent after it
/// subscribed. Clones share the same subscriber list.
///
/// # Example
///
/// ```rust
/// use tddkit::publisher::PassthroughSubject;
/// use tddkit::capture::capture_output;
///
/// let subject = PassthroughSubject::new();
/// let output = capture_output(&subject, 0, || {
///     subject.send("first");
///     subject.send("second");
/// });
/// assert_eq!(output, vec!["first", "second"]);
/// ```
pub struct PassthroughSubject<T> {
    subscribers: Arc<Subscribers<T>>,
}

impl<T: Clone + Send + 'static> PassthroughSubject<T> {
    /// Create a subject with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Subscribers::new(),
        }
    }

    /// Deliver `value` to every current subscriber.
    pub fn send(&self, value: T) {
        self.subscribers.send(&value);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Clone + Send + 'static> Default for PassthroughSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PassthroughSubject<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T: Clone + Send + 'static> Publisher for PassthroughSubject<T> {
    type Output = T;

    fn subscribe(&self, sink: Sink<T>) -> Subscription {
        self.subscribers.register(sink).0
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for PassthroughSubject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassthroughSubject")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

struct PublishedInner<T> {
    value: Mutex<T>,
    /// Orders emissions so subscribers see changes in the order they were stored.
    emitting: ReentrantMutex<()>,
    subscribers: Arc<Subscribers<T>>,
}

/// A current value plus its subsequent changes.
///
/// Subscribing delivers the current value immediately. Every change is
/// stored first and emitted afterwards, so a sink that calls
/// [`get`](Self::get) observes the value being emitted. Clones share the
/// same value.
///
/// # Example
///
/// ```rust
/// use tddkit::publisher::Published;
/// use tddkit::capture::capture_output;
///
/// let text = Published::new(String::new());
/// let output = capture_output(&text, 1, || {
///     text.set("Loading...".to_string());
///     text.set("Finished".to_string());
/// });
/// assert_eq!(output, vec!["Loading...", "Finished"]);
/// ```
pub struct Published<T> {
    inner: Arc<PublishedInner<T>>,
}

impl<T: Clone + Send + 'static> Published<T> {
    /// Create a publisher holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(PublishedInner {
                value: Mutex::new(value),
                emitting: ReentrantMutex::new(()),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// A copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Store `value`, then emit it.
    pub fn set(&self, value: T) {
        let _order = self.inner.emitting.lock();
        *self.inner.value.lock() = value.clone();
        self.inner.subscribers.send(&value);
    }

    /// Update the value in place, then emit the result.
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let _order = self.inner.emitting.lock();
        let value = {
            let mut current = self.inner.value.lock();
            f(&mut current);
            current.clone()
        };
        self.inner.subscribers.send(&value);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<T: Clone + Send + Default + 'static> Default for Published<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for Published<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Publisher for Published<T> {
    type Output = T;

    fn subscribe(&self, sink: Sink<T>) -> Subscription {
        let _order = self.inner.emitting.lock();
        let current = self.get();
        let (subscription, slot) = self.inner.subscribers.register(sink);
        slot.deliver(current);
        subscription
    }
}

impl<T: Clone + Send + fmt::Debug + 'static> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Published")
            .field("value", &*self.inner.value.lock())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
