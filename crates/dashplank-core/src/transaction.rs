//! Pinned-only transactions around bulk dock rewrites.
//!
//! Removing an item and adding it back looks like a fresh launch to the
//! dock, which may then treat it as a transient running app. Forcing the
//! dock's "pinned-only" flag on for the duration of the rewrite keeps every
//! re-added item pinned.

use std::cell::Cell;

use tracing::{debug, warn};

use crate::store::DockPreferences;

/// Which value the flag returns to when a transaction ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// The value read right before the transaction started.
    #[default]
    Previous,
    /// The value captured once by [`PinnedOnlyToggle::capture_activation`].
    /// A preference change made while the daemon runs is reverted by the next
    /// rewrite.
    Activation,
}

#[derive(Debug, Default)]
pub struct PinnedOnlyToggle {
    policy: RestorePolicy,
    activation_value: Cell<Option<bool>>,
}

/// Restores the flag when dropped, so a panicking body cannot leave the dock
/// stuck in pinned-only mode.
struct RestoreOnDrop<'a> {
    prefs: &'a dyn DockPreferences,
    value: bool,
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.prefs.set_pinned_only(self.value) {
            warn!("Failed to restore pinned-only to {}: {}", self.value, e);
        } else {
            debug!("Restored pinned-only to {}", self.value);
        }
    }
}

impl PinnedOnlyToggle {
    pub fn new(policy: RestorePolicy) -> Self {
        Self {
            policy,
            activation_value: Cell::new(None),
        }
    }

    /// Remember the user's preference as it is at activation time.
    pub fn capture_activation(&self, prefs: &dyn DockPreferences) {
        let value = prefs.pinned_only();
        debug!("Captured activation pinned-only value: {}", value);
        self.activation_value.set(Some(value));
    }

    /// Run `body` with pinned-only forced on, then restore the flag whatever
    /// the body returned (or if it panicked).
    pub fn run<T>(&self, prefs: &dyn DockPreferences, body: impl FnOnce() -> T) -> T {
        let previous = prefs.pinned_only();
        let restore_to = match self.policy {
            RestorePolicy::Previous => previous,
            RestorePolicy::Activation => self.activation_value.get().unwrap_or(previous),
        };

        if let Err(e) = prefs.set_pinned_only(true) {
            // Keep going: a rewrite without the flag is still better than
            // leaving the lists diverged.
            warn!("Failed to enable pinned-only: {}", e);
        }

        let _restore = RestoreOnDrop {
            prefs,
            value: restore_to,
        };
        body()
    }
}
