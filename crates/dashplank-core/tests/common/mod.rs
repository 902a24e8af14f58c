//! In-memory stand-ins for the shell favorites, the dock and its settings.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use dashplank_core::error::{Error, Result};
use dashplank_core::{
    AppLookup, DockItems, DockLayout, DockPreferences, FavoritesStore, IdentityMapper,
    InitFlagStore, PinnedOnlyToggle, RestorePolicy, SyncOutcome, Synchronizer,
};

pub const APPS_DIR: &str = "/usr/share/applications";
pub const LAUNCHER_ID: &str = "launcher";
pub const LAUNCHER_FILE: &str = "/home/test/.local/share/applications/launcher.desktop";

pub fn id(name: &str) -> String {
    format!("{}.desktop", name)
}

pub fn uri(name: &str) -> String {
    format!("file://{}/{}.desktop", APPS_DIR, name)
}

pub fn uris(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| uri(n)).collect()
}

pub fn launcher_uri() -> String {
    format!("file://{}", LAUNCHER_FILE)
}

type Hook = Box<dyn Fn()>;

/// Every id resolves except those starting with `missing`.
pub struct FakeApps;

impl AppLookup for FakeApps {
    fn desktop_file(&self, desktop_id: &str) -> Option<PathBuf> {
        if desktop_id.starts_with("missing") {
            None
        } else if desktop_id == id(LAUNCHER_ID) {
            Some(PathBuf::from(LAUNCHER_FILE))
        } else {
            Some(PathBuf::from(APPS_DIR).join(desktop_id))
        }
    }
}

#[derive(Default)]
pub struct FakeFavorites {
    ids: RefCell<Vec<String>>,
    pub calls: RefCell<Vec<String>>,
    hook: RefCell<Option<Hook>>,
}

impl FakeFavorites {
    pub fn new(names: &[&str]) -> Self {
        let favorites = Self::default();
        favorites.set(names);
        favorites
    }

    /// Replace the list without firing the change hook.
    pub fn set(&self, names: &[&str]) {
        *self.ids.borrow_mut() = names.iter().map(|n| id(n)).collect();
    }

    pub fn names(&self) -> Vec<String> {
        self.ids
            .borrow()
            .iter()
            .map(|i| i.trim_end_matches(".desktop").to_string())
            .collect()
    }

    pub fn on_change(&self, hook: impl Fn() + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    fn changed(&self) {
        if let Some(hook) = self.hook.borrow().as_ref() {
            hook();
        }
    }
}

impl FavoritesStore for FakeFavorites {
    fn favorite_ids(&self) -> Vec<String> {
        self.ids.borrow().clone()
    }

    fn add_at(&self, desktop_id: &str, pos: Option<usize>) -> Result<()> {
        {
            let mut ids = self.ids.borrow_mut();
            if ids.iter().any(|i| i == desktop_id) {
                return Ok(());
            }
            let pos = pos.unwrap_or(ids.len()).min(ids.len());
            ids.insert(pos, desktop_id.to_string());
        }
        self.calls.borrow_mut().push(format!("add {}", desktop_id));
        self.changed();
        Ok(())
    }

    fn remove(&self, desktop_id: &str) -> Result<()> {
        {
            let mut ids = self.ids.borrow_mut();
            let Some(pos) = ids.iter().position(|i| i == desktop_id) else {
                return Ok(());
            };
            ids.remove(pos);
        }
        self.calls.borrow_mut().push(format!("remove {}", desktop_id));
        self.changed();
        Ok(())
    }

    fn move_to(&self, desktop_id: &str, pos: usize) -> Result<()> {
        {
            let mut ids = self.ids.borrow_mut();
            let current = ids
                .iter()
                .position(|i| i == desktop_id)
                .ok_or_else(|| Error::Favorites(format!("{} is not a favorite", desktop_id)))?;
            let item = ids.remove(current);
            let pos = pos.min(ids.len());
            ids.insert(pos, item);
        }
        self.calls
            .borrow_mut()
            .push(format!("move {} {}", desktop_id, pos));
        self.changed();
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePrefs {
    pub pinned_only: Cell<bool>,
    pub pinned_writes: RefCell<Vec<bool>>,
    pub dock_items: RefCell<Vec<String>>,
    pub layout: Cell<DockLayout>,
    pub theme: RefCell<Option<String>>,
}

impl FakePrefs {
    pub fn set_order(&self, names: &[&str]) {
        *self.dock_items.borrow_mut() = names.iter().map(|n| format!("{}.dockitem", n)).collect();
    }
}

impl DockPreferences for FakePrefs {
    fn pinned_only(&self) -> bool {
        self.pinned_only.get()
    }

    fn set_pinned_only(&self, value: bool) -> Result<()> {
        self.pinned_only.set(value);
        self.pinned_writes.borrow_mut().push(value);
        Ok(())
    }

    fn dock_items(&self) -> Vec<String> {
        self.dock_items.borrow().clone()
    }

    fn layout(&self) -> Result<DockLayout> {
        Ok(self.layout.get())
    }

    fn set_theme(&self, name: &str) -> Result<()> {
        *self.theme.borrow_mut() = Some(name.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockOp {
    Add(String),
    Remove(String),
}

/// A dock that keeps its item files in `prefs` like the real one does.
pub struct FakeDock {
    items: RefCell<Vec<String>>,
    prefs: Rc<FakePrefs>,
    /// Every mutation with the pinned-only value seen when it was made.
    pub ops: RefCell<Vec<(DockOp, bool)>>,
    pub reject: RefCell<Vec<String>>,
    pub offline: Cell<bool>,
    hook: RefCell<Option<Hook>>,
}

impl FakeDock {
    pub fn new(prefs: Rc<FakePrefs>, items: Vec<String>) -> Self {
        let dock = Self {
            items: RefCell::new(Vec::new()),
            prefs,
            ops: RefCell::new(Vec::new()),
            reject: RefCell::new(Vec::new()),
            offline: Cell::new(false),
            hook: RefCell::new(None),
        };
        for item in items {
            dock.insert(&item);
        }
        dock
    }

    pub fn items(&self) -> Vec<String> {
        self.items.borrow().clone()
    }

    pub fn on_change(&self, hook: impl Fn() + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    fn insert(&self, uri: &str) {
        self.items.borrow_mut().push(uri.to_string());
        self.prefs.dock_items.borrow_mut().push(dockitem(uri));
    }

    fn check_online(&self, method: &str) -> Result<()> {
        if self.offline.get() {
            return Err(Error::bus(method, "The name is not activatable"));
        }
        Ok(())
    }

    fn changed(&self) {
        if let Some(hook) = self.hook.borrow().as_ref() {
            hook();
        }
    }
}

fn dockitem(uri: &str) -> String {
    let name = uri.rsplit('/').next().unwrap_or(uri);
    format!("{}.dockitem", name.trim_end_matches(".desktop"))
}

impl DockItems for FakeDock {
    fn persistent_applications(&self) -> Result<Vec<String>> {
        self.check_online("GetPersistentApplications")?;
        Ok(self.items())
    }

    fn add(&self, uri: &str) -> Result<()> {
        self.check_online("Add")?;
        self.ops
            .borrow_mut()
            .push((DockOp::Add(uri.to_string()), self.prefs.pinned_only()));
        if self.reject.borrow().iter().any(|u| u == uri) {
            return Err(Error::DockRejected {
                action: "add",
                uri: uri.to_string(),
            });
        }
        if !self.items.borrow().iter().any(|u| u == uri) {
            self.insert(uri);
        }
        self.changed();
        Ok(())
    }

    fn remove(&self, uri: &str) -> Result<()> {
        self.check_online("Remove")?;
        self.ops
            .borrow_mut()
            .push((DockOp::Remove(uri.to_string()), self.prefs.pinned_only()));
        self.items.borrow_mut().retain(|u| u != uri);
        let item = dockitem(uri);
        self.prefs.dock_items.borrow_mut().retain(|i| *i != item);
        self.changed();
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        self.check_online("Ping")
    }
}

#[derive(Default)]
pub struct FakeFlag {
    pub initialized: Cell<bool>,
    pub fail_writes: Cell<bool>,
}

impl InitFlagStore for FakeFlag {
    fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    fn mark_initialized(&self) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Io(std::io::Error::other("read-only state dir")));
        }
        self.initialized.set(true);
        Ok(())
    }
}

pub struct Harness {
    pub favorites: Rc<FakeFavorites>,
    pub dock: Rc<FakeDock>,
    pub prefs: Rc<FakePrefs>,
    pub sync: Rc<Synchronizer>,
}

impl Harness {
    pub fn new(favorites: &[&str], dock: &[&str]) -> Self {
        Self::with_policy(favorites, dock, RestorePolicy::Previous)
    }

    pub fn with_policy(favorites: &[&str], dock: &[&str], policy: RestorePolicy) -> Self {
        let favorites = Rc::new(FakeFavorites::new(favorites));
        let prefs = Rc::new(FakePrefs::default());
        let dock = Rc::new(FakeDock::new(prefs.clone(), uris(dock)));
        let mapper = IdentityMapper::new(
            Rc::new(FakeApps),
            LAUNCHER_ID,
            std::path::Path::new(LAUNCHER_FILE),
        );
        let toggle = Rc::new(PinnedOnlyToggle::new(policy));
        toggle.capture_activation(prefs.as_ref());

        let sync = Rc::new(Synchronizer::new(
            favorites.clone(),
            dock.clone(),
            prefs.clone(),
            mapper,
            toggle,
        ));
        Self {
            favorites,
            dock,
            prefs,
            sync,
        }
    }

    /// Like [`Harness::new`] with the synchronizer already accepting events.
    pub fn active(favorites: &[&str], dock: &[&str]) -> Self {
        let harness = Self::new(favorites, dock);
        harness.sync.set_active(true);
        harness
    }

    /// Route both sides' change notifications back into the synchronizer,
    /// synchronously, the way GSettings and the bus signal do. Returns the
    /// outcomes of those nested requests.
    pub fn wire_signals(&self) -> Rc<RefCell<Vec<SyncOutcome>>> {
        let nested = Rc::new(RefCell::new(Vec::new()));

        let sync: Weak<Synchronizer> = Rc::downgrade(&self.sync);
        let log = nested.clone();
        self.favorites.on_change(move || {
            if let Some(sync) = sync.upgrade() {
                log.borrow_mut().push(sync.on_favorites_changed());
            }
        });

        let sync: Weak<Synchronizer> = Rc::downgrade(&self.sync);
        let log = nested.clone();
        self.dock.on_change(move || {
            if let Some(sync) = sync.upgrade() {
                log.borrow_mut().push(sync.on_dock_changed());
            }
        });

        nested
    }

    /// Dock contents as names, launcher excluded.
    pub fn dock_names(&self) -> Vec<String> {
        self.dock
            .items()
            .iter()
            .filter(|u| **u != launcher_uri())
            .map(|u| {
                u.rsplit('/')
                    .next()
                    .unwrap_or(u)
                    .trim_end_matches(".desktop")
                    .to_string()
            })
            .collect()
    }
}
