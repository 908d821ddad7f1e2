//! Per-thread reentrancy guard.
//!
//! Hosts sometimes call back into the engine while it is still deciding a
//! fix (a listener that queries the last known location, for example). Such
//! nested calls must not touch shared state.

use std::cell::Cell;

thread_local! {
    static IN_ENGINE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside the engine until dropped.
#[derive(Debug)]
pub(crate) struct ReentrancyGuard {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl ReentrancyGuard {
    /// Returns `None` if this thread is already inside the engine.
    pub(crate) fn enter() -> Option<Self> {
        IN_ENGINE.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(Self {
                    _not_send: std::marker::PhantomData,
                })
            }
        })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        IN_ENGINE.with(|flag| flag.set(false));
    }
}
