//! First-run bootstrap and the per-connection startup sequence.
//!
//! The very first time the daemon meets a dock it replaces the dock's
//! contents with the favorites. After that a persistent flag says so, and a
//! (re)connecting dock only gets the launcher checked.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::InitFlagStore;
use crate::sync::Synchronizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    /// Waiting for a bootstrap attempt to succeed.
    Bootstrapping,
    Initialized,
}

/// What a newly connected dock needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAction {
    /// Already bootstrapped: the launcher was checked, nothing else to do.
    EnsureLauncher,
    /// Call [`InitializationSequencer::attempt`] until it succeeds.
    Bootstrap,
}

pub struct InitializationSequencer {
    flag: Rc<dyn InitFlagStore>,
    state: Cell<InitState>,
    attempts: Cell<u32>,
    theme_name: String,
    launcher_enabled: Cell<bool>,
}

impl InitializationSequencer {
    pub fn new(flag: Rc<dyn InitFlagStore>, theme_name: &str, launcher_enabled: bool) -> Self {
        let state = if flag.is_initialized() {
            InitState::Initialized
        } else {
            InitState::Uninitialized
        };
        Self {
            flag,
            state: Cell::new(state),
            attempts: Cell::new(0),
            theme_name: theme_name.to_string(),
            launcher_enabled: Cell::new(launcher_enabled),
        }
    }

    pub fn state(&self) -> InitState {
        self.state.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get() == InitState::Initialized
    }

    /// Bootstrap attempts made since the last connection.
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    pub fn set_launcher_enabled(&self, enabled: bool) {
        self.launcher_enabled.set(enabled);
    }

    /// The dock appeared on the bus.
    pub fn on_connected(&self, sync: &Synchronizer) -> ConnectAction {
        self.attempts.set(0);

        if self.is_initialized() {
            if let Err(e) = sync.ensure_launcher(self.launcher_enabled.get()) {
                warn!("Failed to update the launcher item: {}", e);
            }
            sync.set_active(true);
            return ConnectAction::EnsureLauncher;
        }

        info!("First run against this dock, bootstrapping");
        if let Err(e) = sync.preferences().set_theme(&self.theme_name) {
            warn!("Failed to select dock theme '{}': {}", self.theme_name, e);
        }
        self.state.set(InitState::Bootstrapping);
        ConnectAction::Bootstrap
    }

    /// One bootstrap attempt: add the launcher, replace the dock contents
    /// with the favorites and persist the flag. An error means "try again
    /// on the next tick".
    pub fn attempt(&self, sync: &Synchronizer) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let attempt = self.attempts.get() + 1;
        self.attempts.set(attempt);
        debug!("Bootstrap attempt {}", attempt);

        sync.ensure_launcher(self.launcher_enabled.get())?;
        let mutations = sync.rebuild_dock()?;
        self.flag.mark_initialized()?;

        self.state.set(InitState::Initialized);
        sync.set_active(true);
        info!(
            "Bootstrap finished after {} attempt(s), {} dock call(s)",
            attempt, mutations
        );
        Ok(())
    }

    /// The dock left the bus. An unfinished bootstrap starts over on the
    /// next connection.
    pub fn on_disconnected(&self) {
        if self.state.get() == InitState::Bootstrapping {
            debug!("Dock vanished during bootstrap");
            self.state.set(InitState::Uninitialized);
        }
    }
}
