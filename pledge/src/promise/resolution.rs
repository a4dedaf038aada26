use super::subscriber::{Subscriber, schedule_publish, subscribe};
use super::{Promise, Slot, Value};

use tracing::{debug, trace, warn};

/// A candidate for settling a promise.
///
/// This is the tagged form of "a value, a failure, or another promise of
/// this crate". Handlers passed to [`Promise::then`] and friends return
/// anything implementing [`IntoResolution`], which lands here.
pub enum Resolution<T, E> {
    /// Fulfill with a plain value.
    Fulfill(T),

    /// Reject with a reason. A handler returning `Err(reason)` ends up here,
    /// which is how a handler "raises".
    Reject(E),

    /// Adopt the eventual outcome of another promise.
    Follow(Promise<T, E>),
}

/// Conversion into a [`Resolution`].
///
/// Implemented for `Result<T, E>` (`Ok` fulfills, `Err` rejects), for
/// `Promise<T, E>` (the chain flattens onto it) and for `Resolution`
/// itself, which lets a handler pick between the three at run time.
pub trait IntoResolution<T, E>: 'static {
    /// Converts `self` into the candidate a child promise settles with.
    fn into_resolution(self) -> Resolution<T, E>;
}

impl<T: Value, E: Value> IntoResolution<T, E> for Resolution<T, E> {
    fn into_resolution(self) -> Resolution<T, E> {
        self
    }
}

impl<T: Value, E: Value> IntoResolution<T, E> for Result<T, E> {
    fn into_resolution(self) -> Resolution<T, E> {
        match self {
            Ok(value) => Resolution::Fulfill(value),
            Err(reason) => Resolution::Reject(reason),
        }
    }
}

impl<T: Value, E: Value> IntoResolution<T, E> for Promise<T, E> {
    fn into_resolution(self) -> Resolution<T, E> {
        Resolution::Follow(self)
    }
}

/// Settles `promise` with `candidate`.
///
/// A `Follow` candidate is never stored as a value: if it already settled
/// its outcome is copied over, otherwise `promise` subscribes to it and
/// settles when it does. This applies recursively, so chains of promises
/// returning promises flatten to their innermost value.
pub(crate) fn settle_with<T: Value, E: Value>(
    promise: &Promise<T, E>,
    candidate: Resolution<T, E>,
) {
    match candidate {
        Resolution::Fulfill(value) => transition(promise, Slot::Fulfilled(value)),
        Resolution::Reject(reason) => fail_with(promise, reason),
        Resolution::Follow(inner) => follow(promise, inner),
    }
}

/// Rejects `promise` with `reason`, unless it already settled.
pub(crate) fn fail_with<T: Value, E: Value>(promise: &Promise<T, E>, reason: E) {
    transition(promise, Slot::Rejected(reason));
}

fn follow<T: Value, E: Value>(promise: &Promise<T, E>, inner: Promise<T, E>) {
    if promise.ptr_eq(&inner) {
        warn!(id = %promise.id(), "promise resolved with itself; it will stay pending");
        return;
    }

    match inner.outcome() {
        Some(Ok(value)) => transition(promise, Slot::Fulfilled(value)),
        Some(Err(reason)) => transition(promise, Slot::Rejected(reason)),
        None => {
            trace!(id = %promise.id(), inner = %inner.id(), "following pending promise");

            let target = promise.clone();
            subscribe(
                &inner,
                Subscriber::Callback(Box::new(move |outcome: Result<T, E>| {
                    settle_with(&target, outcome.into_resolution());
                })),
            );
        }
    }
}

/// Moves a pending promise into `settled` and schedules its publish pass.
///
/// Later attempts are ignored: the first settlement wins.
fn transition<T: Value, E: Value>(promise: &Promise<T, E>, settled: Slot<T, E>) {
    let state = settled.state();

    {
        let mut core = promise.lock();

        if !core.slot.is_pending() {
            debug!(
                id = %promise.id(),
                current = %core.slot.state(),
                attempted = %state,
                "ignoring settlement of a settled promise"
            );
            return;
        }

        core.slot = settled;
    }

    trace!(id = %promise.id(), %state, "promise settled");
    schedule_publish(promise);
}
