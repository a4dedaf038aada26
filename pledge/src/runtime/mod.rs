//! Deferred-callback scheduling.
//!
//! Promises depend on exactly one host capability: "run this callback
//! after the current synchronous execution finishes". This module defines
//! that capability as the [`Scheduler`] trait and ships an implementation,
//! [`EventLoop`], with a FIFO job queue and a timer heap.
//!
//! It also holds the thread-local "current loop" used by the crate's free
//! functions, mirroring how a runtime exposes its scheduler to code that
//! runs inside it.

mod builder;
mod event_loop;
mod scheduler;
mod timer;

pub(crate) mod context;

pub use builder::EventLoopBuilder;
pub use event_loop::EventLoop;
pub use scheduler::{Handle, IdSequence, Job, PromiseId, Scheduler};
