//! Timer-backed promises.
//!
//! These helpers need a scheduler that supports
//! [`defer_after`](crate::Scheduler::defer_after), such as
//! [`EventLoop`](crate::EventLoop).

mod delay;

#[doc(inline)]
pub use delay::{delay, reject_after};
