//! GNOME Shell favorites (`org.gnome.shell favorite-apps`).
//!
//! Like the shell's own favorites model, entries whose desktop file is not
//! installed are invisible: they are skipped when reading, positions refer
//! to the installed entries only, and a write drops them.

use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use gtk4::gio::{self, prelude::*};
use gtk4::glib::SignalHandlerId;
use tracing::debug;

use dashplank_core::config::FavoritesConfig;
use dashplank_core::{AppLookup, FavoritesStore, Result};

use super::settings;

/// Resolves desktop ids through the installed desktop entries.
#[derive(Debug, Default)]
pub struct DesktopAppLookup;

impl AppLookup for DesktopAppLookup {
    fn desktop_file(&self, desktop_id: &str) -> Option<PathBuf> {
        gio::DesktopAppInfo::new(desktop_id).and_then(|info| info.filename())
    }
}

pub struct ShellFavorites {
    settings: gio::Settings,
    key: String,
    lookup: Rc<dyn AppLookup>,
}

impl ShellFavorites {
    pub fn new(config: &FavoritesConfig, lookup: Rc<dyn AppLookup>) -> Result<Self> {
        let settings = settings::open(&config.schema, None)?;
        if !settings::has_key(&settings, &config.key) {
            return Err(dashplank_core::Error::MissingResource(format!(
                "key '{}' in schema '{}'",
                config.key, config.schema
            )));
        }
        Ok(Self {
            settings,
            key: config.key.clone(),
            lookup,
        })
    }

    /// Call `f` whenever the favorites list changes.
    pub fn connect_changed<F: Fn() + 'static>(&self, f: F) -> SignalHandlerId {
        self.settings
            .connect_changed(Some(&self.key), move |_settings, _key| f())
    }

    pub fn disconnect(&self, handler: SignalHandlerId) {
        self.settings.disconnect(handler);
    }

    fn write(&self, ids: &[String]) -> Result<()> {
        debug!("Writing {} favorite(s)", ids.len());
        settings::set_strv(&self.settings, &self.key, ids)
    }
}

impl FavoritesStore for ShellFavorites {
    fn favorite_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ids = settings::strv(&self.settings, &self.key);
        ids.retain(|id| self.lookup.desktop_file(id).is_some() && seen.insert(id.clone()));
        ids
    }

    fn add_at(&self, desktop_id: &str, pos: Option<usize>) -> Result<()> {
        let mut ids = self.favorite_ids();
        if ids.iter().any(|id| id == desktop_id) {
            return Ok(());
        }
        let pos = pos.unwrap_or(ids.len()).min(ids.len());
        ids.insert(pos, desktop_id.to_string());
        self.write(&ids)
    }

    fn remove(&self, desktop_id: &str) -> Result<()> {
        let mut ids = self.favorite_ids();
        let before = ids.len();
        ids.retain(|id| id != desktop_id);
        if ids.len() == before {
            return Ok(());
        }
        self.write(&ids)
    }

    fn move_to(&self, desktop_id: &str, pos: usize) -> Result<()> {
        let mut ids = self.favorite_ids();
        let Some(current) = ids.iter().position(|id| id == desktop_id) else {
            return Err(dashplank_core::Error::Favorites(format!(
                "{} is not a favorite",
                desktop_id
            )));
        };
        let id = ids.remove(current);
        let pos = pos.min(ids.len());
        ids.insert(pos, id);
        self.write(&ids)
    }
}
