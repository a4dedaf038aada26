//! # pledge
//!
//! **pledge** provides deferred values: single-assignment containers that
//! start pending and settle exactly once, to a value or to a failure
//! reason. Producers of asynchronous results (timers, I/O completions,
//! worker threads) hand consumers a [`Promise`] they can attach
//! continuations to, without blocking a thread and without knowing who is
//! listening.
//!
//! The crate offers:
//!
//! - **Settle-once promises** with `then`, `then_both` and `catch` chaining
//! - **Flattening**: a handler may return another promise and the chain
//!   follows it instead of nesting
//! - **Combinators**: [`all`] (fan-in, first rejection wins) and [`race`]
//!   (first settlement wins)
//! - **Strictly asynchronous continuations**: handlers never run inside the
//!   call that attached them, even on an already-settled promise
//! - An injectable [`Scheduler`] and a bundled [`EventLoop`] with timers
//! - A `#[pledge::test]` attribute that drives an event loop around a test
//!
//! ## Quick Start
//!
//! ```rust
//! use pledge::EventLoop;
//!
//! let event_loop = EventLoop::new();
//!
//! let greeting = event_loop.enter(|| {
//!     pledge::resolve::<_, String>("hello")
//!         .then(|s| Ok(format!("{s}, world")))
//!         .catch(|reason| Ok(format!("recovered from {reason}")))
//! });
//!
//! assert_eq!(event_loop.block_on(&greeting), Ok(String::from("hello, world")));
//! ```
//!
//! ## Modules
//!
//! - [`time`]: promises backed by the scheduler's timers

mod error;
mod promise;
mod runtime;

pub mod time;

pub use error::{Error, Result};
pub use promise::{Fail, IntoResolution, Promise, Resolution, Settle, Settled, State, Value};
pub use runtime::{EventLoop, EventLoopBuilder, Handle, IdSequence, Job, PromiseId, Scheduler};

pub use pledge_macros::test;

/// Creates a promise on the current event loop; see [`Promise::new`].
///
/// # Panics
///
/// Panics if no event loop is entered on this thread.
pub fn promise<T, E, F>(resolver: F) -> Promise<T, E>
where
    T: Value,
    E: Value,
    F: FnOnce(Settle<T, E>, Fail<T, E>) -> std::result::Result<(), E>,
{
    Promise::new(&Handle::current(), resolver)
}

/// Creates a fulfilled promise on the current event loop.
///
/// # Panics
///
/// Panics if no event loop is entered on this thread.
pub fn resolve<T: Value, E: Value>(value: T) -> Promise<T, E> {
    Promise::resolve(&Handle::current(), value)
}

/// Creates a rejected promise on the current event loop.
///
/// # Panics
///
/// Panics if no event loop is entered on this thread.
pub fn reject<T: Value, E: Value>(reason: E) -> Promise<T, E> {
    Promise::reject(&Handle::current(), reason)
}

/// [`Promise::all`] on the current event loop.
///
/// # Panics
///
/// Panics if no event loop is entered on this thread.
pub fn all<T, E, I>(promises: I) -> Promise<Vec<T>, E>
where
    T: Value,
    E: Value,
    I: IntoIterator<Item = Promise<T, E>>,
{
    Promise::all(&Handle::current(), promises)
}

/// [`Promise::race`] on the current event loop.
///
/// # Panics
///
/// Panics if no event loop is entered on this thread.
pub fn race<T, E, I>(promises: I) -> Promise<T, E>
where
    T: Value,
    E: Value,
    I: IntoIterator<Item = Promise<T, E>>,
{
    Promise::race(&Handle::current(), promises)
}
