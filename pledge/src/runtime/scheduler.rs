use super::context;
use crate::error::{Error, Result};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A unit of deferred work handed to a [`Scheduler`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The host's "run this later" capability.
///
/// Promises never run continuations from inside `fulfill`, `reject` or
/// `then`; every notification goes through [`defer`](Self::defer). An
/// implementation must run each job after the caller's current
/// synchronous work has finished, and must preserve the relative order of
/// jobs deferred from the same thread.
///
/// [`EventLoop`](crate::EventLoop) is the bundled implementation. Tests and
/// embedders may supply their own, for example a manual queue that is
/// drained step by step.
pub trait Scheduler: Send + Sync {
    /// Queues `job` to run after the current synchronous execution.
    fn defer(&self, job: Job);

    /// Queues `job` to run once `delay` has elapsed.
    ///
    /// Schedulers without a clock keep the default, which refuses.
    fn defer_after(&self, delay: Duration, job: Job) -> Result<()> {
        let _ = (delay, job);
        Err(Error::TimersUnsupported)
    }
}

/// Diagnostic identifier of a promise.
///
/// Ids are informational only: they take no part in equality or
/// settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PromiseId(u64);

impl PromiseId {
    /// Returns the raw sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A shareable, monotonically increasing id generator.
///
/// Every [`Handle`] carries one. Clones share the same counter, so two
/// event loops built from the same sequence never hand out the same id.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: Arc<AtomicU64>,
}

impl IdSequence {
    /// Creates a sequence starting at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a sequence whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(first)),
        }
    }

    /// Returns the next id, advancing the sequence.
    pub fn next_id(&self) -> PromiseId {
        PromiseId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Capabilities a promise needs from its environment.
///
/// A `Handle` bundles the deferred-callback scheduler with the id
/// sequence. It is cheap to clone; every promise keeps one and passes it
/// on to the children created by `then` and `catch`.
#[derive(Clone)]
pub struct Handle {
    scheduler: Arc<dyn Scheduler>,
    ids: IdSequence,
}

impl Handle {
    /// Wraps `scheduler` with a fresh id sequence.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_ids(scheduler, IdSequence::new())
    }

    /// Wraps `scheduler`, drawing promise ids from `ids`.
    pub fn with_ids(scheduler: Arc<dyn Scheduler>, ids: IdSequence) -> Self {
        Self { scheduler, ids }
    }

    /// Returns the handle of the event loop entered on this thread.
    ///
    /// # Panics
    ///
    /// Panics if called outside [`EventLoop::enter`](crate::EventLoop::enter)
    /// or a loop turn.
    pub fn current() -> Self {
        context::current().expect("Handle::current called outside of an event loop")
    }

    /// Returns the handle of the event loop entered on this thread, if any.
    pub fn try_current() -> Result<Self> {
        context::current().ok_or(Error::NoContext)
    }

    /// Defers `job` through the underlying scheduler.
    pub fn defer<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler.defer(Box::new(job));
    }

    /// Defers `job` until `delay` has elapsed.
    pub fn defer_after<F>(&self, delay: Duration, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler.defer_after(delay, Box::new(job))
    }

    /// Draws the next diagnostic id.
    pub(crate) fn next_id(&self) -> PromiseId {
        self.ids.next_id()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}
