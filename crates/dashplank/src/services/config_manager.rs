//! Configuration state with live reload.
//!
//! A watcher thread monitors `config.toml`. Each change is parsed and
//! validated off the main thread; valid configs are handed to the main
//! loop with `glib::idle_add_once`, where registered listeners receive the
//! old and new values. Invalid files are logged and the running config is
//! kept.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use gtk4::glib;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use tracing::{debug, error, info, warn};

use dashplank_core::Config;

/// Editors emit several events per save; they are batched into one reload.
const FILE_CHANGE_DEBOUNCE_MS: u64 = 300;

const SHUTDOWN_POLL_MS: u64 = 500;

/// Messages from the watcher thread to the main loop.
#[derive(Debug)]
pub enum ConfigMessage {
    /// A new valid config was loaded.
    Reloaded(Box<Config>),
    /// The file changed but did not load or validate.
    Error(String),
}

type ConfigListener = Rc<dyn Fn(&Config, &Config)>;

fn send_config_message(msg: ConfigMessage) {
    glib::idle_add_once(move || match ConfigManager::global() {
        Some(manager) => manager.handle_config_message(msg),
        None => debug!("Config message after shutdown, dropped"),
    });
}

/// Holds the current configuration and notifies listeners on reload.
pub struct ConfigManager {
    config: RefCell<Config>,
    config_path: Option<PathBuf>,
    listeners: RefCell<Vec<ConfigListener>>,
    shutdown_flag: Arc<AtomicBool>,
}

thread_local! {
    static CONFIG_MANAGER_INSTANCE: RefCell<Option<Rc<ConfigManager>>> = const { RefCell::new(None) };
}

impl ConfigManager {
    fn new(config: Config, config_path: Option<PathBuf>) -> Rc<Self> {
        Rc::new(Self {
            config: RefCell::new(config),
            config_path,
            listeners: RefCell::new(Vec::new()),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The main thread's manager, if [`ConfigManager::init_global`] ran.
    pub fn global() -> Option<Rc<Self>> {
        CONFIG_MANAGER_INSTANCE.with(|cell| cell.borrow().clone())
    }

    /// Install the main thread's manager. Later calls are ignored.
    pub fn init_global(config: Config, config_path: Option<PathBuf>) -> Rc<Self> {
        CONFIG_MANAGER_INSTANCE.with(|cell| {
            let mut opt = cell.borrow_mut();
            if let Some(existing) = opt.as_ref() {
                warn!("ConfigManager already initialized, ignoring init_global call");
                return existing.clone();
            }
            let manager = ConfigManager::new(config, config_path);
            *opt = Some(manager.clone());
            manager
        })
    }

    pub fn config(&self) -> Config {
        self.config.borrow().clone()
    }

    /// Call `f(old, new)` after each successful reload.
    pub fn connect_reloaded<F: Fn(&Config, &Config) + 'static>(&self, f: F) {
        self.listeners.borrow_mut().push(Rc::new(f));
    }

    /// Spawn the watcher thread. Does nothing when running on defaults.
    pub fn start_watching(&self) {
        let Some(path) = self.config_path.clone() else {
            info!("No config file to watch (using defaults)");
            return;
        };

        if !path.exists() {
            warn!(
                "Config file does not exist, cannot watch: {}",
                path.display()
            );
            return;
        }

        info!("Watching config file {}", path.display());
        let shutdown_flag = self.shutdown_flag.clone();
        thread::spawn(move || Self::run_file_watcher(path, shutdown_flag));
    }

    fn run_file_watcher(path: PathBuf, shutdown_flag: Arc<AtomicBool>) {
        // notify reports absolute paths.
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to canonicalize config path: {}", e);
                return;
            }
        };

        let target = canonical.clone();
        let mut debouncer = match new_debouncer(
            Duration::from_millis(FILE_CHANGE_DEBOUNCE_MS),
            move |res: DebounceEventResult| match res {
                Ok(events) => {
                    if events.iter().any(|e| e.path == target) {
                        debug!("Config file change detected");
                        Self::reload_and_send(&target);
                    }
                }
                Err(err) => error!("File watcher error: {}", err),
            },
        ) {
            Ok(d) => d,
            Err(e) => {
                error!("Failed to create file watcher: {}", e);
                return;
            }
        };

        if let Err(e) = watch_config_dir(debouncer.watcher(), &canonical) {
            error!("Failed to watch config directory: {}", e);
            return;
        }

        while !shutdown_flag.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(SHUTDOWN_POLL_MS));
        }

        debug!("Config file watcher thread shutting down");
    }

    fn reload_and_send(path: &Path) {
        let msg = match Config::load(path) {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    info!("Config reloaded from {}", path.display());
                    ConfigMessage::Reloaded(Box::new(config))
                }
                Err(e) => ConfigMessage::Error(format!("Config validation failed: {}", e)),
            },
            Err(e) => ConfigMessage::Error(format!("Failed to reload config: {}", e)),
        };
        send_config_message(msg);
    }

    pub(crate) fn handle_config_message(&self, msg: ConfigMessage) {
        match msg {
            ConfigMessage::Reloaded(config) => self.apply_config(*config),
            ConfigMessage::Error(err) => error!("{} (keeping the running configuration)", err),
        }
    }

    fn apply_config(&self, new_config: Config) {
        let old_config = self.config.replace(new_config.clone());
        if old_config == new_config {
            debug!("Config file changed but values did not");
            return;
        }

        for field in restart_required_fields(&old_config, &new_config) {
            warn!("{} changed; restart dashplank to apply it", field);
        }

        // Listeners may register further listeners.
        let listeners: Vec<ConfigListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&old_config, &new_config);
        }
    }

    pub fn stop_watching(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        debug!("Config watcher stopped");
    }
}

/// Editors replace the file on save, so the directory holding it is watched.
fn watch_config_dir(watcher: &mut dyn Watcher, config_file: &Path) -> notify::Result<()> {
    let dir = config_file.parent().unwrap_or(config_file);
    watcher.watch(dir, RecursiveMode::NonRecursive)
}

/// Whether the generated theme must be rewritten.
pub fn theme_changed(old: &Config, new: &Config) -> bool {
    old.theme != new.theme
}

/// Whether the launcher item must be added to or removed from the dock.
pub fn launcher_toggled(old: &Config, new: &Config) -> bool {
    old.launcher.enabled != new.launcher.enabled
}

/// Sections that are only read at startup.
pub fn restart_required_fields(old: &Config, new: &Config) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if old.dock != new.dock {
        fields.push("[dock]");
    }
    if old.favorites != new.favorites {
        fields.push("[favorites]");
    }
    if old.sync.pinned_only_restore != new.sync.pinned_only_restore {
        fields.push("sync.pinned_only_restore");
    }
    if old.launcher.id != new.launcher.id {
        fields.push("launcher.id");
    }
    fields
}
