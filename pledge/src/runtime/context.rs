use super::Handle;

use std::cell::RefCell;

thread_local! {
    /// Handle of the event loop currently entered on this thread.
    ///
    /// Set while an [`EventLoop`](crate::EventLoop) runs jobs or inside
    /// [`EventLoop::enter`](crate::EventLoop::enter), so free functions like
    /// [`crate::resolve`] can reach the scheduler without explicit
    /// parameter passing.
    static CURRENT_HANDLE: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Restores the previously installed handle, even when the closure unwinds.
struct Restore(Option<Handle>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT_HANDLE.with(|cell| {
            cell.replace(previous);
        });
    }
}

/// Runs `f` with `handle` installed as the current handle.
///
/// Calls nest: the previous handle is put back once `f` returns.
pub(crate) fn enter<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT_HANDLE.with(|cell| cell.replace(Some(handle)));
    let _restore = Restore(previous);

    f()
}

/// Returns a clone of the current handle, if any.
pub(crate) fn current() -> Option<Handle> {
    CURRENT_HANDLE.with(|cell| cell.borrow().clone())
}
