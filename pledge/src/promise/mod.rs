//! The deferred value and its chaining protocol.
//!
//! A [`Promise`] starts pending and settles exactly once, either fulfilled
//! with a value or rejected with a reason. Continuations attached with
//! [`then`](Promise::then), [`then_both`](Promise::then_both) and
//! [`catch`](Promise::catch) always run later, from the scheduler, never
//! from inside the call that attached them or the call that settled the
//! promise.

mod combinators;
mod future;
mod resolution;
mod state;
mod subscriber;

pub use future::Settled;
pub use resolution::{IntoResolution, Resolution};
pub use state::State;

pub(crate) use resolution::{fail_with, settle_with};

use crate::runtime::{Handle, PromiseId};
use state::Slot;
use subscriber::{Continuation, Subscriber, subscribe};

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

/// Types that can be carried by a promise, as value or as reason.
///
/// Every subscriber receives its own copy of the settled value, and
/// settlement may come from any thread.
pub trait Value: Clone + Send + 'static {}

impl<T: Clone + Send + 'static> Value for T {}

/// A single-assignment, asynchronously observed result.
///
/// `Promise` is a handle: clones refer to the same deferred value.
pub struct Promise<T, E> {
    inner: Arc<Inner<T, E>>,
}

struct Inner<T, E> {
    id: PromiseId,
    handle: Handle,
    core: Mutex<Core<T, E>>,
}

/// Mutable part of a promise, only touched by its own settle, subscribe
/// and publish operations.
pub(crate) struct Core<T, E> {
    pub(crate) slot: Slot<T, E>,
    pub(crate) subscribers: Vec<Subscriber<T, E>>,
}

impl<T: Value, E: Value> Promise<T, E> {
    /// Creates a promise and runs `resolver` synchronously with its
    /// settlement capabilities.
    ///
    /// If `resolver` returns `Err(reason)` the promise is rejected with
    /// `reason`, unless the resolver already settled it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pledge::{EventLoop, Promise};
    ///
    /// let event_loop = EventLoop::new();
    /// let promise = Promise::<u8, &str>::new(&event_loop.handle(), |settle, _fail| {
    ///     settle.fulfill(7);
    ///     Ok(())
    /// });
    ///
    /// assert_eq!(event_loop.block_on(&promise), Ok(7));
    /// ```
    pub fn new<F>(handle: &Handle, resolver: F) -> Self
    where
        F: FnOnce(Settle<T, E>, Fail<T, E>) -> Result<(), E>,
    {
        let promise = Self::pending(handle);

        let settle = Settle {
            promise: promise.clone(),
        };
        let fail = Fail {
            promise: promise.clone(),
        };

        if let Err(reason) = resolver(settle, fail) {
            trace!(id = %promise.id(), "resolver raised");
            fail_with(&promise, reason);
        }

        promise
    }

    /// Creates a promise already fulfilled with `value`.
    ///
    /// Subscribers are still notified asynchronously.
    pub fn resolve(handle: &Handle, value: T) -> Self {
        let promise = Self::pending(handle);
        settle_with(&promise, Resolution::Fulfill(value));
        promise
    }

    /// Creates a promise already rejected with `reason`.
    pub fn reject(handle: &Handle, reason: E) -> Self {
        let promise = Self::pending(handle);
        fail_with(&promise, reason);
        promise
    }

    /// A pending promise awaiting linkage.
    pub(crate) fn pending(handle: &Handle) -> Self {
        let id = handle.next_id();
        trace!(%id, "promise created");

        Self {
            inner: Arc::new(Inner {
                id,
                handle: handle.clone(),
                core: Mutex::new(Core {
                    slot: Slot::Pending,
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    /// Diagnostic id.
    pub fn id(&self) -> PromiseId {
        self.inner.id
    }

    /// Handle of the scheduler this promise publishes through.
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    /// Current settlement state.
    pub fn state(&self) -> State {
        self.lock().slot.state()
    }

    /// Returns `true` until the promise settles.
    pub fn is_pending(&self) -> bool {
        self.lock().slot.is_pending()
    }

    /// The settled value, or `None` while pending.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        self.lock().slot.outcome()
    }

    /// Attaches a fulfillment handler.
    ///
    /// Returns a child promise settled with the handler's result. A
    /// rejection skips the handler and passes through to the child
    /// unchanged. The handler may return a `Result` or another promise, in
    /// which case the child follows that promise.
    pub fn then<U, F, R>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(T) -> R + Send + 'static,
        R: IntoResolution<U, E>,
    {
        self.chain(
            Continuation::handler(on_fulfilled),
            Continuation::PassThrough(Resolution::Reject),
        )
    }

    /// Attaches both a fulfillment and a rejection handler.
    ///
    /// Exactly one of them runs. If `on_rejected` returns `Ok`, the child
    /// is fulfilled: the chain has recovered.
    pub fn then_both<U, F, R, G, S>(&self, on_fulfilled: F, on_rejected: G) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(T) -> R + Send + 'static,
        R: IntoResolution<U, E>,
        G: FnOnce(E) -> S + Send + 'static,
        S: IntoResolution<U, E>,
    {
        self.chain(
            Continuation::handler(on_fulfilled),
            Continuation::handler(on_rejected),
        )
    }

    /// Attaches a rejection handler; fulfillment passes through.
    ///
    /// If this promise is already fulfilled there is nothing to handle and
    /// the promise itself is returned.
    pub fn catch<G, S>(&self, on_rejected: G) -> Promise<T, E>
    where
        G: FnOnce(E) -> S + Send + 'static,
        S: IntoResolution<T, E>,
    {
        if self.state() == State::Fulfilled {
            return self.clone();
        }

        self.chain(
            Continuation::PassThrough(Resolution::Fulfill),
            Continuation::handler(on_rejected),
        )
    }

    fn chain<U: Value>(
        &self,
        on_fulfilled: Continuation<T, U, E>,
        on_rejected: Continuation<E, U, E>,
    ) -> Promise<U, E> {
        let child = Promise::pending(self.handle());

        match self.outcome() {
            None => subscribe(
                self,
                Subscriber::chained(child.clone(), on_fulfilled, on_rejected),
            ),
            Some(Ok(value)) => self.react_settled(&child, on_fulfilled, value),
            Some(Err(reason)) => self.react_settled(&child, on_rejected, reason),
        }

        child
    }

    /// Links `child` to this already-settled promise.
    ///
    /// A pass-through settles the child right away, no user code runs. A
    /// handler is always deferred.
    fn react_settled<A: Value, U: Value>(
        &self,
        child: &Promise<U, E>,
        continuation: Continuation<A, U, E>,
        argument: A,
    ) {
        match continuation {
            Continuation::PassThrough(forward) => settle_with(child, forward(argument)),
            handler => {
                let target = child.clone();
                self.handle()
                    .defer(move || subscriber::invoke_callback(&target, handler, argument));
            }
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Core<T, E>> {
        self.inner.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Value, E: Value> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

/// Capability to fulfill one promise, handed to a resolver.
///
/// May be cloned, kept, and used from any thread. Only the first
/// settlement of the promise has any effect.
pub struct Settle<T, E> {
    promise: Promise<T, E>,
}

impl<T: Value, E: Value> Settle<T, E> {
    /// Fulfills the promise with `value`.
    pub fn fulfill(&self, value: T) {
        settle_with(&self.promise, Resolution::Fulfill(value));
    }

    /// Makes the promise adopt the eventual outcome of `other`.
    pub fn follow(&self, other: Promise<T, E>) {
        settle_with(&self.promise, Resolution::Follow(other));
    }
}

impl<T, E> Clone for Settle<T, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

/// Capability to reject one promise, handed to a resolver.
pub struct Fail<T, E> {
    promise: Promise<T, E>,
}

impl<T: Value, E: Value> Fail<T, E> {
    /// Rejects the promise with `reason`.
    pub fn reject(&self, reason: E) {
        fail_with(&self.promise, reason);
    }
}

impl<T, E> Clone for Fail<T, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Promise, State};
    use crate::runtime::{Handle, Job, Scheduler};

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Manual {
        jobs: Mutex<VecDeque<Job>>,
    }

    impl Scheduler for Manual {
        fn defer(&self, job: Job) {
            self.jobs.lock().unwrap().push_back(job);
        }
    }

    impl Manual {
        fn drain(&self) {
            loop {
                let job = self.jobs.lock().unwrap().pop_front();
                match job {
                    Some(job) => job(),
                    None => break,
                }
            }
        }

        fn queued(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }
    }

    #[test]
    fn test_publish_drains_subscriber_list() {
        let scheduler = Arc::new(Manual::default());
        let handle = Handle::new(scheduler.clone());

        let parent = Promise::<i32, ()>::new(&handle, |_, _| Ok(()));
        let _a = parent.then(|v| Ok::<_, ()>(v));
        let _b = parent.then(|v| Ok::<_, ()>(v));
        assert_eq!(parent.lock().subscribers.len(), 2);

        super::settle_with(&parent, super::Resolution::Fulfill(1));
        assert_eq!(parent.lock().subscribers.len(), 2);

        scheduler.drain();
        assert!(parent.lock().subscribers.is_empty());
    }

    #[test]
    fn test_settlement_schedules_single_publish() {
        let scheduler = Arc::new(Manual::default());
        let handle = Handle::new(scheduler.clone());

        let promise = Promise::<i32, ()>::new(&handle, |settle, fail| {
            settle.fulfill(1);
            settle.fulfill(2);
            fail.reject(());
            Ok(())
        });

        assert_eq!(promise.state(), State::Fulfilled);
        assert_eq!(scheduler.queued(), 1);
    }

    #[test]
    fn test_late_subscriber_schedules_publish() {
        let scheduler = Arc::new(Manual::default());
        let handle = Handle::new(scheduler.clone());

        let promise = Promise::<i32, ()>::resolve(&handle, 3);
        scheduler.drain();
        assert_eq!(scheduler.queued(), 0);

        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        super::subscribe(
            &promise,
            super::Subscriber::Callback(Box::new(move |outcome: Result<i32, ()>| {
                *sink.lock().unwrap() = Some(outcome);
            })),
        );

        assert_eq!(scheduler.queued(), 1);
        assert_eq!(*seen.lock().unwrap(), None);

        scheduler.drain();
        assert_eq!(*seen.lock().unwrap(), Some(Ok(3)));
    }
}
