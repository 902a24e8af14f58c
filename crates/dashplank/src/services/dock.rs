//! The Plank dock: its item collection over D-Bus and its per-dock
//! GSettings.

use gtk4::gio::{self, prelude::*};
use gtk4::glib::{self, SignalHandlerId, Variant};
use tracing::{debug, info};

use dashplank_core::config::{Config, DockConfig};
use dashplank_core::{DockItems, DockLayout, DockPreferences, Error, Result};

use super::settings;

const DOCK_PATH: &str = "/net/launchpad/plank";
const DOCK_IFACE: &str = "net.launchpad.plank";
pub const ITEMS_IFACE: &str = "net.launchpad.plank.Items";
pub const ITEMS_CHANGED: &str = "Changed";

const KEY_PINNED_ONLY: &str = "pinned-only";
const KEY_DOCK_ITEMS: &str = "dock-items";
const KEY_ICON_SIZE: &str = "icon-size";
const KEY_POSITION: &str = "position";
const KEY_ALIGNMENT: &str = "alignment";
const KEY_THEME: &str = "theme";

/// Settings keys the generated theme depends on.
pub const LAYOUT_KEYS: &[&str] = &[KEY_ICON_SIZE, KEY_POSITION, KEY_ALIGNMENT];

/// Synchronous client for one dock's `net.launchpad.plank.Items` object.
pub struct PlankDock {
    connection: gio::DBusConnection,
    bus_name: String,
    items_path: String,
    timeout_ms: i32,
}

impl PlankDock {
    pub fn new(connection: &gio::DBusConnection, config: &DockConfig) -> Self {
        Self {
            connection: connection.clone(),
            bus_name: config.bus_name.clone(),
            items_path: items_path(&config.id),
            timeout_ms: config.call_timeout_ms,
        }
    }

    /// Call `f` whenever the dock reports a change of its items.
    pub fn subscribe_changed<F: Fn() + 'static>(&self, f: F) -> gio::SignalSubscription {
        self.connection.subscribe_to_signal(
            Some(&self.bus_name),
            Some(ITEMS_IFACE),
            Some(ITEMS_CHANGED),
            Some(&self.items_path),
            None,
            gio::DBusSignalFlags::NONE,
            move |_signal| f(),
        )
    }

    fn call(
        &self,
        path: &str,
        iface: &str,
        method: &str,
        params: Option<&Variant>,
    ) -> Result<Variant> {
        self.connection
            .call_sync(
                Some(&self.bus_name),
                path,
                iface,
                method,
                params,
                None,
                gio::DBusCallFlags::NONE,
                self.timeout_ms,
                None::<&gio::Cancellable>,
            )
            .map_err(|e| Error::bus(method, e))
    }

    /// Add/Remove answer whether the dock accepted the change.
    fn call_item(&self, method: &str, action: &'static str, uri: &str) -> Result<()> {
        let reply = self.call(
            &self.items_path,
            ITEMS_IFACE,
            method,
            Some(&(uri,).to_variant()),
        )?;
        match reply.child_value(0).get::<bool>() {
            Some(true) => Ok(()),
            Some(false) => Err(Error::DockRejected {
                action,
                uri: uri.to_string(),
            }),
            None => Err(Error::bus(
                method,
                format!("unexpected reply type {}", reply.type_()),
            )),
        }
    }
}

impl DockItems for PlankDock {
    fn persistent_applications(&self) -> Result<Vec<String>> {
        const METHOD: &str = "GetPersistentApplications";
        let reply = self.call(&self.items_path, ITEMS_IFACE, METHOD, None)?;
        reply
            .child_value(0)
            .get::<Vec<String>>()
            .ok_or_else(|| Error::bus(METHOD, format!("unexpected reply type {}", reply.type_())))
    }

    fn add(&self, uri: &str) -> Result<()> {
        debug!("Dock Add {}", uri);
        self.call_item("Add", "add", uri)
    }

    fn remove(&self, uri: &str) -> Result<()> {
        debug!("Dock Remove {}", uri);
        self.call_item("Remove", "remove", uri)
    }

    fn ping(&self) -> Result<()> {
        self.call(DOCK_PATH, DOCK_IFACE, "Ping", None).map(|_| ())
    }
}

/// Bus path of a dock's item collection.
pub fn items_path(dock_id: &str) -> String {
    format!("{}/{}", DOCK_PATH, dock_id)
}

/// Start the dock unless it already answers on the bus.
pub fn ensure_running(connection: &gio::DBusConnection, config: &DockConfig) -> Result<()> {
    if PlankDock::new(connection, config).ping().is_ok() {
        debug!("Dock already running");
        return Ok(());
    }
    if config.command.trim().is_empty() {
        debug!("Dock not running and no command configured, waiting for it");
        return Ok(());
    }

    info!("Starting dock: {}", config.command);
    glib::spawn_command_line_async(config.command.as_str())
        .map_err(|e| Error::MissingResource(format!("dock command '{}' ({})", config.command, e)))
}

/// One dock's relocatable settings (`net.launchpad.plank.dock.settings`).
pub struct PlankSettings {
    settings: gio::Settings,
}

impl PlankSettings {
    pub fn new(config: &Config) -> Result<Self> {
        let path = config.dock_settings_path();
        let settings = settings::open(&config.dock.settings_schema, Some(&path))?;
        for key in [KEY_PINNED_ONLY, KEY_DOCK_ITEMS, KEY_THEME] {
            if !settings::has_key(&settings, key) {
                return Err(Error::MissingResource(format!(
                    "key '{}' in schema '{}'",
                    key, config.dock.settings_schema
                )));
            }
        }
        Ok(Self { settings })
    }

    /// Call `f` when `key` changes.
    pub fn connect_changed<F: Fn() + 'static>(&self, key: &str, f: F) -> SignalHandlerId {
        self.settings
            .connect_changed(Some(key), move |_settings, _key| f())
    }

    /// Call `f` when the manual item order changes.
    pub fn connect_order_changed<F: Fn() + 'static>(&self, f: F) -> SignalHandlerId {
        self.connect_changed(KEY_DOCK_ITEMS, f)
    }

    pub fn disconnect(&self, handler: SignalHandlerId) {
        self.settings.disconnect(handler);
    }

    pub fn theme(&self) -> String {
        self.settings.string(KEY_THEME).to_string()
    }
}

impl DockPreferences for PlankSettings {
    fn pinned_only(&self) -> bool {
        self.settings.boolean(KEY_PINNED_ONLY)
    }

    fn set_pinned_only(&self, value: bool) -> Result<()> {
        self.settings
            .set_boolean(KEY_PINNED_ONLY, value)
            .map_err(|e| Error::settings(KEY_PINNED_ONLY, e))?;
        // The dock reads the flag from dconf, not from us.
        gio::Settings::sync();
        Ok(())
    }

    fn dock_items(&self) -> Vec<String> {
        settings::strv(&self.settings, KEY_DOCK_ITEMS)
    }

    fn layout(&self) -> Result<DockLayout> {
        Ok(DockLayout {
            icon_size: self.settings.int(KEY_ICON_SIZE),
            position: self.settings.string(KEY_POSITION).parse()?,
            alignment: self.settings.string(KEY_ALIGNMENT).parse()?,
        })
    }

    fn set_theme(&self, name: &str) -> Result<()> {
        self.settings
            .set_string(KEY_THEME, name)
            .map_err(|e| Error::settings(KEY_THEME, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_path() {
        assert_eq!(items_path("dock1"), "/net/launchpad/plank/dock1");
    }

    #[test]
    fn test_layout_keys() {
        assert_eq!(LAYOUT_KEYS, &["icon-size", "position", "alignment"]);
    }
}
