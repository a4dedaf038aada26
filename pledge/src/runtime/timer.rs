use super::Job;

use std::cmp::Ordering;
use std::time::Instant;

/// An entry in the event loop's timer heap.
///
/// Entries are ordered by deadline, then by insertion sequence, so two
/// timers due at the same instant fire in the order they were set.
pub(crate) struct TimerEntry {
    /// The time at which the job becomes runnable.
    pub(crate) deadline: Instant,

    /// Insertion counter, breaks ties between equal deadlines.
    pub(crate) seq: u64,

    /// The deferred work.
    pub(crate) job: Job,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Reversed so that a `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
