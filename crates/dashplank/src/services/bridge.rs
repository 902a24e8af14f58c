//! Daemon lifecycle: wires the shell favorites, the dock and the core
//! synchronizer together while the dock is on the bus.
//!
//! One [`DockSession`] exists per appearance of the dock's bus name. It
//! owns the synchronizer, the bootstrap retry timer and every signal
//! connection, and is torn down as a whole when the name vanishes.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gtk4::gio;
use gtk4::glib::{self, ControlFlow, SignalHandlerId};
use tracing::{debug, info, warn};

use dashplank_core::{
    AppLookup, Config, ConnectAction, IdentityMapper, InitFlagStore, InitializationSequencer,
    PinnedOnlyToggle, Result, Synchronizer,
};

use super::config_manager::{launcher_toggled, theme_changed};
use super::dock::{self, PlankDock, PlankSettings};
use super::favorites::{DesktopAppLookup, ShellFavorites};
use super::launcher::{self, LauncherFiles};
use super::theme::DockTheme;

struct DockSession {
    sync: Rc<Synchronizer>,
    init_timer: RefCell<Option<glib::SourceId>>,
    subscriptions: RefCell<Vec<gio::SignalSubscription>>,
    favorites_handler: RefCell<Option<SignalHandlerId>>,
    order_handler: RefCell<Option<SignalHandlerId>>,
}

pub struct Bridge {
    connection: gio::DBusConnection,
    config: RefCell<Config>,
    lookup: Rc<dyn AppLookup>,
    favorites: Rc<ShellFavorites>,
    prefs: Rc<PlankSettings>,
    toggle: Rc<PinnedOnlyToggle>,
    theme: Rc<DockTheme>,
    launcher: LauncherFiles,
    sequencer: InitializationSequencer,
    session: RefCell<Option<Rc<DockSession>>>,
    // gio 0.21 does not export the `WatcherId` returned by `bus_watch_name`
    // (it is shadowed by the `DBusConnection` one), so store the unwatch call.
    watcher: RefCell<Option<Box<dyn FnOnce()>>>,
    registration: RefCell<Option<gio::RegistrationId>>,
}

impl Bridge {
    /// Open the favorites and dock settings. Fails when their schemas are
    /// not installed.
    pub fn new(
        connection: &gio::DBusConnection,
        config: &Config,
        flag: Rc<dyn InitFlagStore>,
    ) -> Result<Rc<Self>> {
        let lookup: Rc<dyn AppLookup> = Rc::new(DesktopAppLookup);
        let favorites = Rc::new(ShellFavorites::new(&config.favorites, lookup.clone())?);
        let prefs = Rc::new(PlankSettings::new(config)?);
        let theme = DockTheme::new(prefs.clone(), &config.theme);

        Ok(Rc::new(Self {
            connection: connection.clone(),
            config: RefCell::new(config.clone()),
            lookup,
            favorites,
            prefs,
            toggle: Rc::new(PinnedOnlyToggle::new(config.restore_policy())),
            theme,
            launcher: LauncherFiles::new(&config.launcher.id),
            sequencer: InitializationSequencer::new(
                flag,
                &config.theme.name,
                config.launcher.enabled,
            ),
            session: RefCell::new(None),
            watcher: RefCell::new(None),
            registration: RefCell::new(None),
        }))
    }

    pub fn activate(self: &Rc<Self>) -> Result<()> {
        let config = self.config.borrow().clone();

        self.toggle.capture_activation(self.prefs.as_ref());

        if config.launcher.enabled
            && let Err(e) = self.launcher.install()
        {
            warn!("Failed to install launcher files: {}", e);
        }

        debug!("Writing dock theme {}", self.theme.name());
        self.theme.activate();

        match launcher::export(&self.connection, &config.dock.command) {
            Ok(id) => {
                self.registration.replace(Some(id));
            }
            Err(e) => warn!("Launcher actions unavailable: {}", e),
        }

        dock::ensure_running(&self.connection, &config.dock)?;

        let appeared = Rc::downgrade(self);
        let vanished = Rc::downgrade(self);
        let id = gio::bus_watch_name_on_connection(
            &self.connection,
            &config.dock.bus_name,
            gio::BusNameWatcherFlags::NONE,
            move |_connection, name, owner| {
                debug!("{} appeared ({})", name, owner);
                if let Some(bridge) = appeared.upgrade() {
                    bridge.on_dock_appeared();
                }
            },
            move |_connection, name| {
                debug!("{} vanished", name);
                if let Some(bridge) = vanished.upgrade() {
                    bridge.on_dock_vanished();
                }
            },
        );
        self.watcher
            .replace(Some(Box::new(move || gio::bus_unwatch_name(id))));

        info!("Watching for dock {}", config.dock.bus_name);
        Ok(())
    }

    pub fn deactivate(&self) {
        self.on_dock_vanished();

        if let Some(unwatch) = self.watcher.take() {
            unwatch();
        }
        self.theme.deactivate();
        if let Some(id) = self.registration.take() {
            launcher::unexport(&self.connection, id);
        }
        info!("Bridge deactivated");
    }

    /// Apply a reloaded configuration.
    pub fn reconfigure(&self, old: &Config, new: &Config) {
        self.config.replace(new.clone());

        if theme_changed(old, new) {
            info!("Theme configuration changed, rewriting theme");
            self.theme.reconfigure(&new.theme);
        }

        if launcher_toggled(old, new) {
            let enabled = new.launcher.enabled;
            info!(
                "Launcher {} {}",
                self.launcher.id(),
                if enabled { "enabled" } else { "disabled" }
            );
            if enabled && let Err(e) = self.launcher.install() {
                warn!("Failed to install launcher files: {}", e);
            }
            self.sequencer.set_launcher_enabled(enabled);

            let session = self.session.borrow().clone();
            if let Some(session) = session
                && self.sequencer.is_initialized()
                && let Err(e) = session.sync.ensure_launcher(enabled)
            {
                warn!("Failed to update the launcher item: {}", e);
            }
        }
    }

    fn on_dock_appeared(self: &Rc<Self>) {
        // A name owner change without a vanish in between.
        self.on_dock_vanished();

        let config = self.config.borrow().clone();
        let dock = Rc::new(PlankDock::new(&self.connection, &config.dock));
        let mapper = IdentityMapper::new(
            self.lookup.clone(),
            &config.launcher.id,
            self.launcher.desktop_path(),
        );
        let sync = Rc::new(Synchronizer::new(
            self.favorites.clone(),
            dock.clone(),
            self.prefs.clone(),
            mapper,
            self.toggle.clone(),
        ));

        let session = Rc::new(DockSession {
            sync,
            init_timer: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
            favorites_handler: RefCell::new(None),
            order_handler: RefCell::new(None),
        });
        self.connect_session(&session, &dock);
        self.session.replace(Some(session.clone()));

        match self.sequencer.on_connected(&session.sync) {
            ConnectAction::EnsureLauncher => info!("Dock connected"),
            ConnectAction::Bootstrap => self.start_bootstrap(&session, config.sync.init_retry_ms),
        }
    }

    fn connect_session(&self, session: &DockSession, dock: &PlankDock) {
        let sync = Rc::downgrade(&session.sync);
        session
            .subscriptions
            .borrow_mut()
            .push(dock.subscribe_changed(move || {
                if let Some(sync) = sync.upgrade() {
                    sync.on_dock_changed();
                }
            }));

        let sync = Rc::downgrade(&session.sync);
        let handler = self.favorites.connect_changed(move || {
            if let Some(sync) = sync.upgrade() {
                sync.on_favorites_changed();
            }
        });
        session.favorites_handler.replace(Some(handler));

        let sync = Rc::downgrade(&session.sync);
        let handler = self.prefs.connect_order_changed(move || {
            if let Some(sync) = sync.upgrade() {
                sync.on_dock_order_changed();
            }
        });
        session.order_handler.replace(Some(handler));
    }

    fn start_bootstrap(self: &Rc<Self>, session: &Rc<DockSession>, interval_ms: u64) {
        let bridge = Rc::downgrade(self);
        let weak_session = Rc::downgrade(session);
        let id = glib::timeout_add_local(Duration::from_millis(interval_ms), move || {
            let (Some(bridge), Some(session)) = (bridge.upgrade(), weak_session.upgrade()) else {
                return ControlFlow::Break;
            };
            match bridge.sequencer.attempt(&session.sync) {
                Ok(()) => {
                    session.init_timer.replace(None);
                    ControlFlow::Break
                }
                Err(e) => {
                    debug!("Bootstrap attempt failed, retrying: {}", e);
                    ControlFlow::Continue
                }
            }
        });
        session.init_timer.replace(Some(id));
    }

    fn on_dock_vanished(&self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.sync.set_active(false);
        if let Some(id) = session.init_timer.take() {
            id.remove();
        }
        session.subscriptions.borrow_mut().clear();
        if let Some(handler) = session.favorites_handler.take() {
            self.favorites.disconnect(handler);
        }
        if let Some(handler) = session.order_handler.take() {
            self.prefs.disconnect(handler);
        }

        self.sequencer.on_disconnected();
        info!("Dock disconnected");
    }
}
