//! Core of dashplank: configuration, identity mapping, the reconciliation
//! engine and the dock theme calculator.
//!
//! Nothing here touches GSettings or the session bus directly; the daemon
//! provides those through the traits in [`store`].

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod logging;
pub mod state;
pub mod store;
pub mod sync;
pub mod theme;
pub mod transaction;

pub use bootstrap::{ConnectAction, InitState, InitializationSequencer};
pub use config::{Config, ConfigLoadResult, DEFAULT_CONFIG_TOML};
pub use error::{Error, Result};
pub use guard::ReentrancyGuard;
pub use identity::IdentityMapper;
pub use state::StateFile;
pub use store::{AppLookup, DockItems, DockPreferences, FavoritesStore, InitFlagStore};
pub use sync::{SyncOutcome, Synchronizer};
pub use theme::{DockAlignment, DockLayout, DockPosition, ThemeParameters};
pub use transaction::{PinnedOnlyToggle, RestorePolicy};
