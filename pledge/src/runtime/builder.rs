use super::{EventLoop, IdSequence};

/// Default number of job slots reserved up front.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Builder for configuring and creating an [`EventLoop`].
///
/// # Examples
///
/// ```rust
/// use pledge::EventLoopBuilder;
///
/// let event_loop = EventLoopBuilder::new()
///     .name("ui")
///     .queue_capacity(256)
///     .first_id(1_000)
///     .build();
/// # drop(event_loop);
/// ```
pub struct EventLoopBuilder {
    /// Initial capacity of the ready queue.
    queue_capacity: usize,

    /// Source of diagnostic promise ids.
    ids: IdSequence,

    /// Name recorded on the loop's tracing span.
    name: String,
}

impl EventLoopBuilder {
    /// Creates a builder with default configuration.
    ///
    /// Ids start at zero, the queue reserves a small number of slots and
    /// the loop is named `pledge`.
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            ids: IdSequence::new(),
            name: String::from("pledge"),
        }
    }

    /// Sets how many jobs the ready queue reserves room for.
    ///
    /// The queue still grows past this; zero is allowed.
    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.queue_capacity = n;
        self
    }

    /// Starts a fresh id sequence at `first`.
    pub fn first_id(mut self, first: u64) -> Self {
        self.ids = IdSequence::starting_at(first);
        self
    }

    /// Draws ids from an existing, possibly shared, sequence.
    pub fn id_sequence(mut self, ids: IdSequence) -> Self {
        self.ids = ids;
        self
    }

    /// Names the loop in its tracing span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the event loop.
    pub fn build(self) -> EventLoop {
        EventLoop::with_config(self.queue_capacity, self.ids, self.name)
    }
}

impl Default for EventLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
