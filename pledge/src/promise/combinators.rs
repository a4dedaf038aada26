use super::subscriber::{Subscriber, subscribe};
use super::{IntoResolution, Promise, Resolution, Value, fail_with, settle_with};
use crate::runtime::Handle;

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

/// Values collected so far by [`Promise::all`].
struct Record<T> {
    remaining: usize,
    values: Vec<Option<T>>,
}

impl<T: Value, E: Value> Promise<Vec<T>, E> {
    /// Waits for every input to fulfill.
    ///
    /// The result is fulfilled with the values in input order, or rejected
    /// with the first rejection observed, without waiting for the other
    /// inputs. An empty input fulfills with an empty vector.
    pub fn all<I>(handle: &Handle, promises: I) -> Self
    where
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let aggregate = Promise::pending(handle);
        let promises: Vec<Promise<T, E>> = promises.into_iter().collect();

        trace!(id = %aggregate.id(), inputs = promises.len(), "all");

        if promises.is_empty() {
            settle_with(&aggregate, Resolution::Fulfill(Vec::new()));
            return aggregate;
        }

        let record = Arc::new(Mutex::new(Record {
            remaining: promises.len(),
            values: vec![None; promises.len()],
        }));

        for (index, promise) in promises.iter().enumerate() {
            match promise.outcome() {
                None => {
                    let target = aggregate.clone();
                    let record = record.clone();

                    subscribe(
                        promise,
                        Subscriber::Callback(Box::new(move |outcome: Result<T, E>| match outcome {
                            Ok(value) => collect(&target, &record, index, value),
                            Err(reason) => fail_with(&target, reason),
                        })),
                    );
                }
                Some(Ok(value)) => collect(&aggregate, &record, index, value),
                Some(Err(reason)) => {
                    fail_with(&aggregate, reason);
                    break;
                }
            }
        }

        aggregate
    }
}

/// Stores the value of input `index`, fulfilling `aggregate` once the last
/// input has reported.
fn collect<T: Value, E: Value>(
    aggregate: &Promise<Vec<T>, E>,
    record: &Mutex<Record<T>>,
    index: usize,
    value: T,
) {
    let values = {
        let mut record = record.lock().unwrap_or_else(PoisonError::into_inner);
        record.values[index] = Some(value);
        record.remaining -= 1;

        if record.remaining > 0 {
            return;
        }

        mem::take(&mut record.values)
    };

    settle_with(
        aggregate,
        Resolution::Fulfill(values.into_iter().flatten().collect()),
    );
}

impl<T: Value, E: Value> Promise<T, E> {
    /// Settles like whichever input settles first.
    ///
    /// Later settlements are ignored. An empty input leaves the result
    /// pending forever.
    pub fn race<I>(handle: &Handle, promises: I) -> Self
    where
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let winner = Promise::pending(handle);

        for promise in promises {
            match promise.outcome() {
                None => {
                    let target = winner.clone();
                    subscribe(
                        &promise,
                        Subscriber::Callback(Box::new(move |outcome: Result<T, E>| {
                            settle_with(&target, outcome.into_resolution());
                        })),
                    );
                }
                Some(outcome) => {
                    settle_with(&winner, outcome.into_resolution());
                    break;
                }
            }
        }

        winner
    }
}
