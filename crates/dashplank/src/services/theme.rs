//! Writes the generated Plank theme and keeps it current.
//!
//! The theme's paddings depend on the dock's icon size, position and
//! alignment, so the file is rewritten whenever one of those settings
//! changes.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gtk4::glib::{self, SignalHandlerId};
use tracing::{debug, info, warn};

use dashplank_core::config::ThemeConfig;
use dashplank_core::theme::THEME_GROUP;
use dashplank_core::{DockPreferences, Error, Result, ThemeParameters};

use super::dock::{LAYOUT_KEYS, PlankSettings};

const THEME_TEMPLATE: &str = include_str!("../../templates/dock.theme");
const THEME_FILE: &str = "dock.theme";

/// `<data dir>/plank/themes/<name>/dock.theme`
pub fn theme_path(name: &str) -> PathBuf {
    glib::user_data_dir()
        .join("plank")
        .join("themes")
        .join(name)
        .join(THEME_FILE)
}

/// Fill the theme template with `params`.
pub fn render(params: &ThemeParameters, with_indicator: bool) -> Result<glib::KeyFile> {
    let keys = glib::KeyFile::new();
    keys.load_from_data(THEME_TEMPLATE, glib::KeyFileFlags::KEEP_COMMENTS)
        .map_err(|e| Error::MissingResource(format!("theme template ({})", e)))?;

    for (key, value) in params.entries(with_indicator) {
        keys.set_string(THEME_GROUP, key, &value);
    }
    Ok(keys)
}

fn save(keys: &glib::KeyFile, dest: &Path) -> Result<()> {
    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir)?;
    }
    keys.save_to_file(dest)
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
}

pub struct DockTheme {
    prefs: Rc<PlankSettings>,
    name: RefCell<String>,
    panel_height: Cell<u32>,
    indicator: Cell<bool>,
    handlers: RefCell<Vec<SignalHandlerId>>,
}

impl DockTheme {
    pub fn new(prefs: Rc<PlankSettings>, config: &ThemeConfig) -> Rc<Self> {
        Rc::new(Self {
            prefs,
            name: RefCell::new(config.name.clone()),
            panel_height: Cell::new(config.panel_height),
            indicator: Cell::new(config.indicator),
            handlers: RefCell::new(Vec::new()),
        })
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    /// Write the theme once and rewrite it on every layout change.
    pub fn activate(self: &Rc<Self>) {
        let mut handlers = self.handlers.borrow_mut();
        if !handlers.is_empty() {
            return;
        }
        for key in LAYOUT_KEYS {
            let weak = Rc::downgrade(self);
            handlers.push(self.prefs.connect_changed(key, move || {
                if let Some(theme) = weak.upgrade() {
                    theme.update_logged();
                }
            }));
        }
        drop(handlers);

        self.update_logged();
    }

    pub fn deactivate(&self) {
        for handler in self.handlers.borrow_mut().drain(..) {
            self.prefs.disconnect(handler);
        }
    }

    /// Compute and write the theme for the dock's current layout.
    pub fn update(&self) -> Result<ThemeParameters> {
        let layout = self.prefs.layout()?;
        let params = ThemeParameters::compute(&layout, self.panel_height.get())?;
        let dest = theme_path(&self.name.borrow());

        save(&render(&params, self.indicator.get())?, &dest)?;
        debug!(
            "Wrote {} for icon size {}, {} / {}",
            dest.display(),
            layout.icon_size,
            layout.position,
            layout.alignment
        );
        Ok(params)
    }

    fn update_logged(&self) {
        if let Err(e) = self.update() {
            warn!("Failed to update dock theme: {}", e);
        }
    }

    /// Apply a new `[theme]` section. A rename also switches the dock to
    /// the new theme.
    pub fn reconfigure(&self, config: &ThemeConfig) {
        let renamed = *self.name.borrow() != config.name;
        *self.name.borrow_mut() = config.name.clone();
        self.panel_height.set(config.panel_height);
        self.indicator.set(config.indicator);

        self.update_logged();
        if renamed {
            info!("Switching dock theme to {}", config.name);
            if let Err(e) = self.prefs.set_theme(&config.name) {
                warn!("Failed to select dock theme: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashplank_core::{DockAlignment, DockLayout, DockPosition};

    fn params() -> ThemeParameters {
        let layout = DockLayout {
            icon_size: 64,
            position: DockPosition::Left,
            alignment: DockAlignment::Fill,
        };
        ThemeParameters::compute(&layout, 32).unwrap()
    }

    #[test]
    fn test_render_sets_computed_keys() {
        let keys = render(&params(), true).unwrap();

        assert_eq!(keys.string(THEME_GROUP, "HorizPadding").unwrap().as_str(), "5.00");
        assert_eq!(keys.string(THEME_GROUP, "TopPadding").unwrap().as_str(), "2.97");
        assert_eq!(keys.string(THEME_GROUP, "ItemPadding").unwrap().as_str(), "4.53");
        assert_eq!(keys.string(THEME_GROUP, "IndicatorSize").unwrap().as_str(), "3.75");
    }

    #[test]
    fn test_render_keeps_template_keys() {
        let keys = render(&params(), false).unwrap();

        // Untouched template value.
        assert_eq!(keys.string(THEME_GROUP, "IndicatorSize").unwrap().as_str(), "5.00");
        assert!(keys.has_group("PlankTheme"));
        assert_eq!(keys.string(THEME_GROUP, "CascadeHide").unwrap().as_str(), "true");
    }

    #[test]
    fn test_theme_path() {
        let path = theme_path("DashToPlank");
        assert!(path.ends_with("plank/themes/DashToPlank/dock.theme"));
    }

    #[test]
    fn test_save_creates_directories() {
        let dest = std::env::temp_dir()
            .join(format!("dashplank-theme-{}", std::process::id()))
            .join("nested")
            .join(THEME_FILE);
        save(&render(&params(), true).unwrap(), &dest).unwrap();

        let written = fs::read_to_string(&dest).unwrap();
        assert!(written.contains("HorizPadding=5.00"));

        let _ = fs::remove_dir_all(dest.parent().unwrap().parent().unwrap());
    }
}
