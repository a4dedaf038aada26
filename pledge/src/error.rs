use thiserror::Error;

/// Errors raised by the scheduling layer.
///
/// Rejection reasons never pass through this type: a promise's failure
/// reason is its own `E` and flows through the chain untouched. `Error`
/// only describes misuse of the host collaborators (no event loop on the
/// current thread, a scheduler without timer support).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No event loop has been entered on the current thread.
    #[error("no event loop is running on this thread")]
    NoContext,

    /// The scheduler behind a [`Handle`](crate::Handle) cannot run
    /// callbacks after a delay.
    #[error("scheduler does not support timers")]
    TimersUnsupported,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
