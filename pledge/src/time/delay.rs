use crate::error::Result;
use crate::promise::{Promise, Resolution, Value, fail_with, settle_with};
use crate::runtime::Handle;

use std::time::Duration;

use tracing::trace;

/// Creates a promise fulfilled with `value` once `duration` has elapsed.
///
/// The timer is registered immediately; the promise's subscribers are
/// notified from the timer's job.
///
/// # Errors
///
/// Returns [`Error::TimersUnsupported`](crate::Error::TimersUnsupported) if
/// the handle's scheduler has no clock.
///
/// # Examples
///
/// ```rust
/// use pledge::EventLoop;
/// use pledge::time::delay;
/// use std::time::Duration;
///
/// let event_loop = EventLoop::new();
/// let later = delay::<_, ()>(&event_loop.handle(), Duration::from_millis(5), "done").unwrap();
///
/// assert_eq!(event_loop.block_on(&later), Ok("done"));
/// ```
pub fn delay<T: Value, E: Value>(
    handle: &Handle,
    duration: Duration,
    value: T,
) -> Result<Promise<T, E>> {
    let promise = Promise::pending(handle);
    let target = promise.clone();

    handle.defer_after(duration, move || {
        settle_with(&target, Resolution::Fulfill(value));
    })?;

    trace!(id = %promise.id(), ?duration, "delay armed");
    Ok(promise)
}

/// Creates a promise rejected with `reason` once `duration` has elapsed.
///
/// Handy as the losing (or winning) side of a [`Promise::race`] used as a
/// deadline.
///
/// # Errors
///
/// Returns [`Error::TimersUnsupported`](crate::Error::TimersUnsupported) if
/// the handle's scheduler has no clock.
pub fn reject_after<T: Value, E: Value>(
    handle: &Handle,
    duration: Duration,
    reason: E,
) -> Result<Promise<T, E>> {
    let promise = Promise::pending(handle);
    let target = promise.clone();

    handle.defer_after(duration, move || fail_with(&target, reason))?;

    trace!(id = %promise.id(), ?duration, "rejection armed");
    Ok(promise)
}
