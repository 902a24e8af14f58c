//! dashplank - keeps GNOME Shell favorites and the Plank dock in sync
//!
//! Without a command this runs the daemon; the commands are one-shot
//! diagnostics against the live settings and bus.

mod services;

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use gtk4::gio::{self, prelude::*};
use gtk4::glib;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use dashplank_core::{
    Config, DockItems, DockPreferences, FavoritesStore, InitFlagStore, StateFile,
    ThemeParameters, logging,
};

use crate::services::bridge::Bridge;
use crate::services::config_manager::ConfigManager;
use crate::services::dock::{PlankDock, PlankSettings};
use crate::services::favorites::{DesktopAppLookup, ShellFavorites};
use crate::services::launcher::APPLICATION_ID;
use crate::services::notify::notify_error;
use crate::services::shell::{Overview, ShellCli};

/// dashplank - keeps GNOME Shell favorites and the Plank dock in sync
#[derive(Parser, Debug)]
#[command(name = "dashplank", version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit (returns non-zero on errors)
    #[arg(long)]
    check_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show favorites, dock items and bootstrap state
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the theme parameters for the dock's current layout
    Theme,
    /// Open the shell's application overview
    ShowApps {
        /// Open the activities overview instead
        #[arg(long)]
        activities: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    logging::init(args.verbose);

    if args.print_example_config {
        print!("{}", dashplank_core::DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    // An explicit --config must exist and be valid.
    let load_result = match Config::find_and_load(args.config.as_deref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref source) = load_result.source {
        info!("Loaded configuration from {:?}", source);
    } else if load_result.used_defaults {
        info!("Using default configuration (no config file found)");
    }

    let config = load_result.config;

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if args.check_config {
        if let Some(ref source) = load_result.source {
            println!("Configuration valid: {}", source.display());
        } else {
            println!("Configuration valid (using defaults)");
        }
        println!("\n{}", config.summary());
        return ExitCode::SUCCESS;
    }

    if let Some(command) = args.command {
        return handle_command(command, &config);
    }

    run_daemon(config, load_result.source)
}

fn handle_command(command: Command, config: &Config) -> ExitCode {
    let result = match command {
        Command::Status { json } => handle_status_command(config, json),
        Command::Theme => handle_theme_command(config),
        Command::ShowApps { activities } => handle_show_apps_command(activities),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Serialize)]
struct Status {
    favorites: Vec<String>,
    /// `None` when the dock is not on the bus.
    dock_items: Option<Vec<String>>,
    pinned_only: bool,
    theme: String,
    initialized: bool,
    initialized_at: Option<String>,
}

fn handle_status_command(config: &Config, json: bool) -> dashplank_core::Result<()> {
    let favorites = ShellFavorites::new(&config.favorites, Rc::new(DesktopAppLookup))?;
    let prefs = PlankSettings::new(config)?;
    let state = StateFile::open(StateFile::default_path()).snapshot();

    let dock_items = match gio::bus_get_sync(gio::BusType::Session, None::<&gio::Cancellable>) {
        Ok(connection) => match PlankDock::new(&connection, &config.dock).persistent_applications() {
            Ok(items) => Some(items),
            Err(e) => {
                debug!("Dock unavailable: {}", e);
                None
            }
        },
        Err(e) => {
            debug!("No session bus: {}", e);
            None
        }
    };

    let status = Status {
        favorites: favorites.favorite_ids(),
        dock_items,
        pinned_only: prefs.pinned_only(),
        theme: prefs.theme(),
        initialized: state.initialized,
        initialized_at: state.initialized_at,
    };

    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| dashplank_core::Error::Io(std::io::Error::other(e)))?;
        println!("{}", out);
        return Ok(());
    }

    println!("Favorites ({}):", status.favorites.len());
    for id in &status.favorites {
        println!("  {}", id);
    }
    match &status.dock_items {
        Some(items) => {
            println!("Dock items ({}):", items.len());
            for uri in items {
                println!("  {}", uri);
            }
        }
        None => println!("Dock items: (dock not running)"),
    }
    println!("Pinned only: {}", status.pinned_only);
    println!("Theme: {}", status.theme);
    match &status.initialized_at {
        Some(at) if status.initialized => println!("Initialized: yes ({})", at),
        _ if status.initialized => println!("Initialized: yes"),
        _ => println!("Initialized: no"),
    }
    Ok(())
}

fn handle_theme_command(config: &Config) -> dashplank_core::Result<()> {
    let layout = PlankSettings::new(config)?.layout()?;
    let params = ThemeParameters::compute(&layout, config.theme.panel_height)?;

    println!(
        "# icon size {}, {} / {}, panel {}px",
        layout.icon_size, layout.position, layout.alignment, config.theme.panel_height
    );
    for (key, value) in params.entries(config.theme.indicator) {
        println!("{}={}", key, value);
    }
    Ok(())
}

fn handle_show_apps_command(activities: bool) -> dashplank_core::Result<()> {
    let shell = ShellCli::new().ok_or(dashplank_core::Error::Disconnected)?;
    let overview = if activities {
        Overview::Activities
    } else {
        Overview::Applications
    };
    shell.show(overview)
}

/// Report an error that stops the daemon.
fn fatal(app: &gio::Application, failed: &Cell<bool>, message: &str) {
    error!("{}", message);
    notify_error("dashplank stopped", message);
    failed.set(true);
    app.quit();
}

fn run_daemon(config: Config, config_source: Option<PathBuf>) -> ExitCode {
    let manager = ConfigManager::init_global(config, config_source);

    // A second instance only activates the first one and exits.
    let app = gio::Application::builder()
        .application_id(APPLICATION_ID)
        .build();

    let failed = Rc::new(Cell::new(false));
    let bridge_slot: Rc<RefCell<Option<Rc<Bridge>>>> = Rc::new(RefCell::new(None));
    let hold_slot: Rc<RefCell<Option<gio::ApplicationHoldGuard>>> = Rc::new(RefCell::new(None));

    {
        let manager = manager.clone();
        let failed = failed.clone();
        let bridge_slot = bridge_slot.clone();
        let hold_slot = hold_slot.clone();
        app.connect_activate(move |app| {
            if bridge_slot.borrow().is_some() {
                debug!("Already running");
                return;
            }

            let Some(connection) = app.dbus_connection() else {
                fatal(app, &failed, "No session bus connection");
                return;
            };

            let config = manager.config();
            let flag: Rc<dyn InitFlagStore> = Rc::new(StateFile::open(StateFile::default_path()));
            let bridge = match Bridge::new(&connection, &config, flag) {
                Ok(bridge) => bridge,
                Err(e) => {
                    fatal(app, &failed, &format!("Cannot start: {}", e));
                    return;
                }
            };
            if let Err(e) = bridge.activate() {
                bridge.deactivate();
                fatal(app, &failed, &format!("Cannot start: {}", e));
                return;
            }

            let weak = Rc::downgrade(&bridge);
            manager.connect_reloaded(move |old, new| {
                if let Some(bridge) = weak.upgrade() {
                    bridge.reconfigure(old, new);
                }
            });
            manager.start_watching();

            bridge_slot.replace(Some(bridge));
            hold_slot.replace(Some(app.hold()));
            info!("dashplank running");
        });
    }

    app.connect_startup(|app| {
        for signum in [libc::SIGINT, libc::SIGTERM] {
            let app = app.clone();
            glib::unix_signal_add_local(signum, move || {
                info!("Received signal {}, quitting", signum);
                app.quit();
                glib::ControlFlow::Break
            });
        }
    });

    {
        let bridge_slot = bridge_slot.clone();
        let hold_slot = hold_slot.clone();
        let manager = manager.clone();
        app.connect_shutdown(move |_| {
            info!("Shutting down");
            manager.stop_watching();
            if let Some(bridge) = bridge_slot.take() {
                bridge.deactivate();
            }
            hold_slot.take();
        });
    }

    // Arguments were already parsed by clap.
    let empty_args: Vec<String> = vec![];
    let status = app.run_with_args(&empty_args);

    if failed.get() || status != glib::ExitCode::SUCCESS {
        warn!("dashplank exited with an error");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
