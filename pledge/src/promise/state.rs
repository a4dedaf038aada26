use std::fmt;

/// Observable settlement state of a promise.
///
/// The only transitions are `Pending -> Fulfilled` and
/// `Pending -> Rejected`, each taken at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Not settled yet.
    Pending,

    /// Settled with a success value.
    Fulfilled,

    /// Settled with a failure reason.
    Rejected,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Pending => "pending",
            State::Fulfilled => "fulfilled",
            State::Rejected => "rejected",
        })
    }
}

/// State and settled value, stored together so a value cannot exist
/// without its matching state.
pub(crate) enum Slot<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T: Clone, E: Clone> Slot<T, E> {
    pub(crate) fn state(&self) -> State {
        match self {
            Slot::Pending => State::Pending,
            Slot::Fulfilled(_) => State::Fulfilled,
            Slot::Rejected(_) => State::Rejected,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }

    /// Copy of the settled value, `None` while pending.
    pub(crate) fn outcome(&self) -> Option<Result<T, E>> {
        match self {
            Slot::Pending => None,
            Slot::Fulfilled(value) => Some(Ok(value.clone())),
            Slot::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}
