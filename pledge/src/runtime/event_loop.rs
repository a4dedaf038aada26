use super::timer::TimerEntry;
use super::{Handle, IdSequence, Job, Scheduler, context};
use crate::error::Result;
use crate::promise::{Promise, Value};

use std::collections::{BinaryHeap, VecDeque};
use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug_span, trace};

/// Pending work of an event loop.
struct Queue {
    /// Jobs ready to run, in submission order.
    jobs: VecDeque<Job>,

    /// Jobs waiting for their deadline.
    timers: BinaryHeap<TimerEntry>,

    /// Next timer insertion sequence.
    next_seq: u64,
}

impl Queue {
    /// Moves every timer whose deadline has passed into the ready queue.
    ///
    /// Returns the deadline of the earliest timer still pending.
    fn fire_due_timers(&mut self, now: Instant) -> Option<Instant> {
        while let Some(entry) = self.timers.peek() {
            if entry.deadline > now {
                return Some(entry.deadline);
            }

            if let Some(entry) = self.timers.pop() {
                self.jobs.push_back(entry.job);
            }
        }

        None
    }
}

/// State shared between an [`EventLoop`] and the handles it gave out.
pub(crate) struct Shared {
    queue: Mutex<Queue>,

    /// Signalled whenever a job or timer is queued, so a loop blocked in
    /// [`EventLoop::block_on`] or waiting on a timer wakes up.
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for Shared {
    fn defer(&self, job: Job) {
        self.lock().jobs.push_back(job);
        self.ready.notify_one();
    }

    fn defer_after(&self, delay: Duration, job: Job) -> Result<()> {
        let deadline = Instant::now() + delay;

        {
            let mut queue = self.lock();
            let seq = queue.next_seq;
            queue.next_seq += 1;
            queue.timers.push(TimerEntry { deadline, seq, job });
        }

        self.ready.notify_one();
        Ok(())
    }
}

/// A single-threaded deferred-callback scheduler.
///
/// `EventLoop` owns a FIFO queue of jobs plus a heap of timers. Promises
/// created from its [`Handle`] defer every notification into that queue;
/// nothing runs until the loop is driven with [`turn`](Self::turn),
/// [`run_until_idle`](Self::run_until_idle), [`run`](Self::run) or
/// [`block_on`](Self::block_on).
///
/// Handles are `Send`, so promises may be settled from other threads. The
/// resulting notifications are still executed by whichever thread drives
/// the loop.
///
/// # Examples
///
/// ```rust
/// use pledge::{EventLoop, Promise};
///
/// let event_loop = EventLoop::new();
/// let handle = event_loop.handle();
///
/// let doubled = Promise::<i32, String>::resolve(&handle, 21).then(|v| Ok(v * 2));
///
/// assert_eq!(event_loop.block_on(&doubled), Ok(42));
/// ```
pub struct EventLoop {
    shared: Arc<Shared>,

    handle: Handle,

    /// Name recorded on the loop's tracing span.
    name: String,
}

impl EventLoop {
    /// Creates an event loop with default configuration.
    pub fn new() -> Self {
        super::EventLoopBuilder::new().build()
    }

    pub(crate) fn with_config(capacity: usize, ids: IdSequence, name: String) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                jobs: VecDeque::with_capacity(capacity),
                timers: BinaryHeap::new(),
                next_seq: 0,
            }),
            ready: Condvar::new(),
        });

        let handle = Handle::with_ids(shared.clone(), ids);

        Self {
            shared,
            handle,
            name,
        }
    }

    /// Returns a handle for creating promises scheduled on this loop.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Runs `f` with this loop installed as the thread's current loop.
    ///
    /// Inside `f`, [`Handle::current`] and the crate-level free functions
    /// ([`crate::resolve`], [`crate::all`], ...) target this loop.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        context::enter(self.handle.clone(), f)
    }

    /// Returns the number of jobs ready to run right now.
    pub fn pending_jobs(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    /// Returns the number of timers not yet fired.
    pub fn pending_timers(&self) -> usize {
        self.shared.lock().timers.len()
    }

    /// Runs a single ready job.
    ///
    /// Timers whose deadline has passed are promoted first. Returns `false`
    /// if there was nothing to run.
    pub fn turn(&self) -> bool {
        let job = {
            let mut queue = self.shared.lock();
            queue.fire_due_timers(Instant::now());
            queue.jobs.pop_front()
        };

        match job {
            Some(job) => {
                self.enter(job);
                true
            }
            None => false,
        }
    }

    /// Runs jobs until the ready queue is empty, without waiting for timers.
    ///
    /// Jobs queued by the jobs being run are executed in the same call.
    /// Returns how many jobs ran.
    pub fn run_until_idle(&self) -> usize {
        let span = debug_span!("event_loop", name = %self.name);
        let _entered = span.enter();

        self.drain()
    }

    /// Runs until both the ready queue and the timer heap are empty.
    ///
    /// The calling thread sleeps while only future timers remain. Returns
    /// how many jobs ran.
    pub fn run(&self) -> usize {
        let span = debug_span!("event_loop", name = %self.name);
        let _entered = span.enter();

        let mut ran = 0;

        loop {
            ran += self.drain();

            let mut queue = self.shared.lock();
            let next = queue.fire_due_timers(Instant::now());

            if !queue.jobs.is_empty() {
                continue;
            }

            let Some(deadline) = next else {
                break;
            };

            let timeout = deadline.saturating_duration_since(Instant::now());
            trace!(?timeout, "waiting for timer");

            drop(
                self.shared
                    .ready
                    .wait_timeout(queue, timeout)
                    .unwrap_or_else(PoisonError::into_inner),
            );
        }

        trace!(jobs = ran, "event loop idle");
        ran
    }

    /// Drives the loop until `promise` settles and returns its outcome.
    ///
    /// Unlike [`run`](Self::run), this also waits for work deferred from
    /// other threads, so a promise settled by a worker thread can be
    /// awaited synchronously.
    ///
    /// Blocks forever if nothing ever settles `promise`.
    pub fn block_on<T, E>(&self, promise: &Promise<T, E>) -> Result<T, E>
    where
        T: Value,
        E: Value,
    {
        let span = debug_span!("event_loop", name = %self.name, promise = %promise.id());
        let _entered = span.enter();

        loop {
            if let Some(outcome) = promise.outcome() {
                return outcome;
            }

            if self.turn() {
                continue;
            }

            let mut queue = self.shared.lock();
            let next = queue.fire_due_timers(Instant::now());

            if !queue.jobs.is_empty() {
                continue;
            }

            drop(match next {
                Some(deadline) => {
                    let timeout = deadline.saturating_duration_since(Instant::now());
                    self.shared
                        .ready
                        .wait_timeout(queue, timeout)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .shared
                    .ready
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner),
            });
        }
    }

    fn drain(&self) -> usize {
        let mut ran = 0;

        while self.turn() {
            ran += 1;
        }

        ran
    }
}

impl Drop for EventLoop {
    /// Discards work that never ran.
    ///
    /// Queued jobs hold promises, which hold handles back to this loop, so
    /// the queue is emptied explicitly to release them.
    fn drop(&mut self) {
        let (jobs, timers) = {
            let mut queue = self.shared.lock();
            (mem::take(&mut queue.jobs), mem::take(&mut queue.timers))
        };

        if !jobs.is_empty() || !timers.is_empty() {
            trace!(
                jobs = jobs.len(),
                timers = timers.len(),
                "dropping unfinished work"
            );
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
