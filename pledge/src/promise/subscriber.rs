use super::resolution::settle_with;
use super::{Promise, Resolution, Value};

use std::mem;
use std::panic::{self, AssertUnwindSafe};

use tracing::{trace, warn};

/// One recorded interest in a promise's settlement.
pub(crate) enum Subscriber<T, E> {
    /// A `then`/`catch` link: two continuations bound to a child promise.
    Chained(Box<dyn Reaction<T, E>>),

    /// A bare callback with no child, used by the resolution procedure,
    /// the combinators and the future adapter.
    Callback(Box<dyn FnOnce(Result<T, E>) + Send>),
}

impl<T, E> Subscriber<T, E> {
    pub(crate) fn chained<U>(
        child: Promise<U, E>,
        on_fulfilled: Continuation<T, U, E>,
        on_rejected: Continuation<E, U, E>,
    ) -> Self
    where
        T: Value,
        U: Value,
        E: Value,
    {
        Subscriber::Chained(Box::new(ChildReaction {
            child,
            on_fulfilled,
            on_rejected,
        }))
    }

    fn notify(self, outcome: Result<T, E>) {
        match self {
            Subscriber::Chained(reaction) => reaction.react(outcome),
            Subscriber::Callback(callback) => callback(outcome),
        }
    }
}

/// What to do with one kind of settlement.
pub(crate) enum Continuation<A, U, E> {
    /// A user handler. Its result becomes the child's resolution.
    Handler(Box<dyn FnOnce(A) -> Resolution<U, E> + Send>),

    /// No handler was supplied: forward the settlement unchanged.
    PassThrough(fn(A) -> Resolution<U, E>),
}

impl<A: Value, U: Value, E: Value> Continuation<A, U, E> {
    pub(crate) fn handler<F, R>(f: F) -> Self
    where
        F: FnOnce(A) -> R + Send + 'static,
        R: super::IntoResolution<U, E>,
    {
        Continuation::Handler(Box::new(move |argument| f(argument).into_resolution()))
    }
}

/// Type-erased child link, so a `Promise<T, E>` can hold children of any
/// value type `U`.
pub(crate) trait Reaction<T, E>: Send {
    fn react(self: Box<Self>, outcome: Result<T, E>);
}

struct ChildReaction<T, U, E> {
    child: Promise<U, E>,
    on_fulfilled: Continuation<T, U, E>,
    on_rejected: Continuation<E, U, E>,
}

impl<T: Value, U: Value, E: Value> Reaction<T, E> for ChildReaction<T, U, E> {
    fn react(self: Box<Self>, outcome: Result<T, E>) {
        let ChildReaction {
            child,
            on_fulfilled,
            on_rejected,
        } = *self;

        match outcome {
            Ok(value) => invoke_callback(&child, on_fulfilled, value),
            Err(reason) => invoke_callback(&child, on_rejected, reason),
        }
    }
}

/// Runs `continuation` with the parent's settled value and settles `child`
/// with what it produced.
///
/// A pass-through forwards the value as-is. A handler's `Ok` fulfills the
/// child whichever way the parent settled, so a rejection handler that
/// returns normally recovers the chain; its `Err` rejects the child.
pub(crate) fn invoke_callback<A, U: Value, E: Value>(
    child: &Promise<U, E>,
    continuation: Continuation<A, U, E>,
    argument: A,
) {
    let resolution = match continuation {
        Continuation::Handler(handler) => handler(argument),
        Continuation::PassThrough(forward) => forward(argument),
    };

    settle_with(child, resolution);
}

/// Records `subscriber` on `parent`.
///
/// If `parent` has already settled, a publish pass is scheduled so the
/// late subscriber is still notified, exactly once and asynchronously.
pub(crate) fn subscribe<T: Value, E: Value>(parent: &Promise<T, E>, subscriber: Subscriber<T, E>) {
    let settled = {
        let mut core = parent.lock();
        core.subscribers.push(subscriber);
        !core.slot.is_pending()
    };

    trace!(id = %parent.id(), settled, "subscriber attached");

    if settled {
        schedule_publish(parent);
    }
}

/// Defers one publish pass for `promise`.
pub(crate) fn schedule_publish<T: Value, E: Value>(promise: &Promise<T, E>) {
    let target = promise.clone();
    promise.handle().defer(move || publish(&target));
}

/// Notifies, in attachment order, every subscriber recorded so far.
///
/// The list is taken out before anyone is notified: each subscriber is
/// delivered once, and subscribers attached by a notification are picked up
/// by the pass their own `subscribe` call scheduled.
///
/// A panicking subscriber does not stop the pass: the remaining
/// subscribers are still notified, then the first panic resumes.
fn publish<T: Value, E: Value>(promise: &Promise<T, E>) {
    let (outcome, subscribers) = {
        let mut core = promise.lock();

        let Some(outcome) = core.slot.outcome() else {
            return;
        };

        (outcome, mem::take(&mut core.subscribers))
    };

    if subscribers.is_empty() {
        return;
    }

    trace!(id = %promise.id(), count = subscribers.len(), "publishing settlement");

    let mut panicked = None;

    for subscriber in subscribers {
        let delivery = outcome.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| subscriber.notify(delivery)));

        if let Err(payload) = result {
            warn!(id = %promise.id(), "subscriber panicked during publish");
            panicked.get_or_insert(payload);
        }
    }

    if let Some(payload) = panicked {
        panic::resume_unwind(payload);
    }
}
