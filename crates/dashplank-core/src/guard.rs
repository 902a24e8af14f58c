//! Single-flag reentrancy guard.
//!
//! Reconciliations mutate one side, which makes that side emit a change
//! signal, which asks for another reconciliation. While one pass is running,
//! every further request is dropped instead of queued.

use std::cell::Cell;

use tracing::trace;

#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    held: Cell<bool>,
}

/// Proof of holding the guard. Dropping it releases the guard, including
/// during unwinding.
#[must_use]
pub struct GuardToken<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Take the guard, or `None` if it is already held.
    pub fn try_enter(&self) -> Option<GuardToken<'_>> {
        if self.held.replace(true) {
            trace!("Reentrancy guard busy, dropping request");
            return None;
        }
        Some(GuardToken { flag: &self.held })
    }

    /// Run `body` while holding the guard. Returns `None` without running it
    /// if the guard is already held.
    pub fn run<T>(&self, body: impl FnOnce() -> T) -> Option<T> {
        let _token = self.try_enter()?;
        Some(body())
    }
}
