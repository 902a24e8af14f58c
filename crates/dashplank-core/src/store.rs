//! Seams to the outside world.
//!
//! The daemon implements these over GSettings and the session bus; tests
//! implement them in memory. All calls happen on one thread, so methods take
//! `&self` and implementations use interior mutability.

use std::path::PathBuf;

use crate::error::Result;
use crate::theme::DockLayout;

/// Resolves desktop-entry ids to installed desktop files.
pub trait AppLookup {
    /// Absolute path of the desktop file for `desktop_id`, if installed.
    fn desktop_file(&self, desktop_id: &str) -> Option<PathBuf>;
}

/// The shell-owned favorites list, addressed by desktop-entry id.
pub trait FavoritesStore {
    /// Desktop-entry ids in dash order.
    fn favorite_ids(&self) -> Vec<String>;

    /// Insert `desktop_id` at `pos`, or append when `pos` is `None` or past
    /// the end. Adding an id that is already a favorite does nothing.
    fn add_at(&self, desktop_id: &str, pos: Option<usize>) -> Result<()>;

    /// Remove `desktop_id`. Removing a non-favorite does nothing.
    fn remove(&self, desktop_id: &str) -> Result<()>;

    /// Move an existing favorite to `pos` (clamped to the list).
    fn move_to(&self, desktop_id: &str, pos: usize) -> Result<()>;
}

/// The dock's item collection, reached over the message bus.
pub trait DockItems {
    /// URIs of every persistent (pinned) item, launcher included.
    fn persistent_applications(&self) -> Result<Vec<String>>;

    fn add(&self, uri: &str) -> Result<()>;

    fn remove(&self, uri: &str) -> Result<()>;

    /// Cheap liveness check.
    fn ping(&self) -> Result<()>;
}

/// The dock's own configuration store.
pub trait DockPreferences {
    fn pinned_only(&self) -> bool;

    fn set_pinned_only(&self, value: bool) -> Result<()>;

    /// Dock item filenames (`*.dockitem`) in the dock's manual sort order.
    fn dock_items(&self) -> Vec<String>;

    /// Inputs of the theme calculator.
    fn layout(&self) -> Result<DockLayout>;

    /// Select the dock theme by name.
    fn set_theme(&self, name: &str) -> Result<()>;
}

/// Persistence of the one-time bootstrap flag.
pub trait InitFlagStore {
    fn is_initialized(&self) -> bool;

    fn mark_initialized(&self) -> Result<()>;
}
