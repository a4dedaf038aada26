use super::subscriber::{Subscriber, subscribe};
use super::{Promise, Value};

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

/// Outcome slot shared with the subscriber registered by [`Settled`].
struct Waiting<T, E> {
    outcome: Option<Result<T, E>>,
    waker: Option<Waker>,
}

/// Future returned by awaiting a [`Promise`].
///
/// Resolves to the promise's outcome. A promise that already settled is
/// ready on first poll; otherwise a subscriber is attached once and wakes
/// the task when the promise's publish pass runs, so the promise's event
/// loop must be driven for the future to complete.
///
/// Dropping a `Settled` does not affect the promise.
pub struct Settled<T, E> {
    promise: Promise<T, E>,
    waiting: Option<Arc<Mutex<Waiting<T, E>>>>,
}

impl<T: Value, E: Value> Future for Settled<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(waiting) = &this.waiting {
            let mut waiting = waiting.lock().unwrap_or_else(PoisonError::into_inner);

            if let Some(outcome) = waiting.outcome.take() {
                return Poll::Ready(outcome);
            }

            waiting.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        if let Some(outcome) = this.promise.outcome() {
            return Poll::Ready(outcome);
        }

        let waiting = Arc::new(Mutex::new(Waiting {
            outcome: None,
            waker: Some(cx.waker().clone()),
        }));

        let sink = waiting.clone();
        subscribe(
            &this.promise,
            Subscriber::Callback(Box::new(move |outcome: Result<T, E>| {
                let waker = {
                    let mut waiting = sink.lock().unwrap_or_else(PoisonError::into_inner);
                    waiting.outcome = Some(outcome);
                    waiting.waker.take()
                };

                if let Some(waker) = waker {
                    waker.wake();
                }
            })),
        );

        this.waiting = Some(waiting);
        Poll::Pending
    }
}

impl<T: Value, E: Value> IntoFuture for Promise<T, E> {
    type Output = Result<T, E>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        Settled {
            promise: self,
            waiting: None,
        }
    }
}
