//! Favorites <-> dock reconciliation.
//!
//! Three passes share one [`ReentrancyGuard`]:
//!
//! - favorites -> dock: the only direction that mutates the dock. A single
//!   trailing append is forwarded as one `Add`; anything else rewrites the
//!   whole dock inside a pinned-only transaction.
//! - dock -> favorites: additive/subtractive only, order is ignored.
//! - dock order -> favorites: moves favorites to match the dock's manual
//!   sort. The dock is never reordered from the favorites.
//!
//! Planning is pure (`plan_*`), execution goes through the store traits.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::guard::ReentrancyGuard;
use crate::identity::{IdentityMapper, desktop_id_from_uri};
use crate::store::{DockItems, DockPreferences, FavoritesStore};
use crate::transaction::PinnedOnlyToggle;

/// What the dock needs to match the favorites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockPlan {
    InSync,
    /// The favorites are the dock plus one trailing item.
    Append(String),
    /// Remove everything, then add the favorites in order.
    Rebuild {
        remove: Vec<String>,
        add: Vec<String>,
    },
}

/// One mutation of the favorites list, by URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesEdit {
    Append(String),
    Remove(String),
    Move { uri: String, pos: usize },
}

/// Plan the favorites -> dock direction.
pub fn plan_dock_update(favorites: &[String], dock: &[String]) -> DockPlan {
    if favorites == dock {
        return DockPlan::InSync;
    }

    if let Some((last, head)) = favorites.split_last()
        && head == dock
    {
        return DockPlan::Append(last.clone());
    }

    DockPlan::Rebuild {
        remove: dock.to_vec(),
        add: favorites.to_vec(),
    }
}

/// Plan the dock -> favorites direction: append what only the dock has,
/// remove what only the favorites have.
pub fn plan_favorites_update(favorites: &[String], dock: &[String]) -> Vec<FavoritesEdit> {
    let additions = dock
        .iter()
        .filter(|uri| !favorites.contains(uri))
        .map(|uri| FavoritesEdit::Append(uri.clone()));
    let removals = favorites
        .iter()
        .filter(|uri| !dock.contains(uri))
        .map(|uri| FavoritesEdit::Remove(uri.clone()));

    additions.chain(removals).collect()
}

/// Plan the moves that bring `favorites` into `dock_order`.
///
/// Positions are visited in ascending order and each move is applied to a
/// working copy, so every index is looked up against the list as it is after
/// the previous moves. Dock items that are not favorites are skipped.
pub fn plan_reorder(favorites: &[String], dock_order: &[String]) -> Vec<FavoritesEdit> {
    let mut working = favorites.to_vec();
    let mut moves = Vec::new();

    for (idx, uri) in dock_order.iter().enumerate() {
        let Some(current) = working.iter().position(|u| u == uri) else {
            continue;
        };
        let target = idx.min(working.len() - 1);
        if current == target {
            continue;
        }

        let item = working.remove(current);
        working.insert(target, item);
        moves.push(FavoritesEdit::Move {
            uri: uri.clone(),
            pos: target,
        });
    }

    moves
}

/// Result of one reconciliation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Bootstrap has not completed; events are ignored.
    Inactive,
    /// Another reconciliation was running; this one was dropped.
    Busy,
    /// The pass ran and issued this many mutation calls.
    Applied { mutations: usize },
    /// The pass gave up; the lists converge on the next event.
    Failed(String),
}

impl SyncOutcome {
    pub fn mutations(&self) -> usize {
        match self {
            Self::Applied { mutations } => *mutations,
            _ => 0,
        }
    }
}

/// Keeps one favorites list and one dock in agreement.
pub struct Synchronizer {
    favorites: Rc<dyn FavoritesStore>,
    dock: Rc<dyn DockItems>,
    prefs: Rc<dyn DockPreferences>,
    mapper: IdentityMapper,
    toggle: Rc<PinnedOnlyToggle>,
    guard: ReentrancyGuard,
    active: Cell<bool>,
}

impl Synchronizer {
    pub fn new(
        favorites: Rc<dyn FavoritesStore>,
        dock: Rc<dyn DockItems>,
        prefs: Rc<dyn DockPreferences>,
        mapper: IdentityMapper,
        toggle: Rc<PinnedOnlyToggle>,
    ) -> Self {
        Self {
            favorites,
            dock,
            prefs,
            mapper,
            toggle,
            guard: ReentrancyGuard::new(),
            active: Cell::new(false),
        }
    }

    /// Start or stop reacting to change events.
    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_held()
    }

    pub fn preferences(&self) -> &dyn DockPreferences {
        self.prefs.as_ref()
    }

    // Snapshots

    /// Favorites as URIs, in dash order.
    pub fn favorite_uris(&self) -> Vec<String> {
        self.mapper.app_uris(&self.favorites.favorite_ids())
    }

    /// Persistent dock items as URIs, launcher excluded.
    pub fn dock_uris(&self) -> Result<Vec<String>> {
        let items = self.dock.persistent_applications()?;
        Ok(self.mapper.without_launcher(items))
    }

    /// Dock items in the dock's manual order, launcher excluded.
    pub fn dock_order(&self) -> Vec<String> {
        self.mapper.item_uris(&self.prefs.dock_items())
    }

    // Event handlers

    /// The favorites list changed.
    pub fn on_favorites_changed(&self) -> SyncOutcome {
        if !self.is_active() {
            return SyncOutcome::Inactive;
        }
        self.guarded("favorites changed", || {
            let favorites = self.favorite_uris();
            let dock = self.dock_uris()?;
            self.push_to_dock(&favorites, &dock)
        })
    }

    /// The dock's persistent items changed.
    pub fn on_dock_changed(&self) -> SyncOutcome {
        if !self.is_active() {
            return SyncOutcome::Inactive;
        }
        self.guarded("dock changed", || {
            let favorites = self.favorite_uris();
            let dock = self.dock_uris()?;
            self.pull_from_dock(&favorites, &dock)
        })
    }

    /// The dock's item order changed.
    pub fn on_dock_order_changed(&self) -> SyncOutcome {
        if !self.is_active() {
            return SyncOutcome::Inactive;
        }
        self.guarded("dock order changed", || {
            let favorites = self.favorite_uris();
            let order = self.dock_order();
            self.reorder(&favorites, &order)
        })
    }

    // Snapshot-driven passes

    /// Make the dock match `favorites`, given the dock currently holds `dock`.
    pub fn reconcile_from_favorites(&self, favorites: &[String], dock: &[String]) -> SyncOutcome {
        self.guarded("favorites -> dock", || self.push_to_dock(favorites, dock))
    }

    /// Make the favorites hold the same items as `dock`.
    pub fn reconcile_from_dock(&self, favorites: &[String], dock: &[String]) -> SyncOutcome {
        self.guarded("dock -> favorites", || self.pull_from_dock(favorites, dock))
    }

    /// Order the favorites like `dock_order`.
    pub fn reorder_favorites_from_dock(
        &self,
        favorites: &[String],
        dock_order: &[String],
    ) -> SyncOutcome {
        self.guarded("dock order -> favorites", || {
            self.reorder(favorites, dock_order)
        })
    }

    /// Replace the dock contents with the favorites unconditionally, with
    /// pinned-only forced on. Used by the first-run bootstrap.
    pub fn rebuild_dock(&self) -> Result<usize> {
        let outcome = self.guard.run(|| {
            let favorites = self.favorite_uris();
            let dock = self.dock_uris()?;
            Ok(self.rewrite_dock(&dock, &favorites))
        });
        outcome.unwrap_or(Err(Error::Busy))
    }

    /// Add the launcher pseudo-item if `enabled` and it is missing, or
    /// remove it if disabled and present. Returns whether the dock changed.
    pub fn ensure_launcher(&self, enabled: bool) -> Result<bool> {
        let uri = self.mapper.launcher_uri().to_string();
        let present = self
            .dock
            .persistent_applications()?
            .iter()
            .any(|u| self.mapper.is_launcher(u));

        match (enabled, present) {
            (true, false) => {
                info!("Adding launcher to the dock");
                self.dock.add(&uri)?;
                Ok(true)
            }
            (false, true) => {
                info!("Removing launcher from the dock");
                self.dock.remove(&uri)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // Internals

    fn guarded(&self, label: &str, body: impl FnOnce() -> Result<usize>) -> SyncOutcome {
        match self.guard.run(body) {
            None => {
                debug!("Skipping '{}': reconciliation in progress", label);
                SyncOutcome::Busy
            }
            Some(Ok(mutations)) => {
                if mutations > 0 {
                    debug!("'{}' issued {} mutation(s)", label, mutations);
                }
                SyncOutcome::Applied { mutations }
            }
            Some(Err(e)) => {
                warn!("'{}' failed: {}", label, e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    fn push_to_dock(&self, favorites: &[String], dock: &[String]) -> Result<usize> {
        match plan_dock_update(favorites, dock) {
            DockPlan::InSync => Ok(0),
            DockPlan::Append(uri) => {
                debug!("Appending {} to the dock", uri);
                self.dock.add(&uri)?;
                Ok(1)
            }
            DockPlan::Rebuild { remove, add } => Ok(self.rewrite_dock(&remove, &add)),
        }
    }

    /// Remove `remove`, then add `add`, inside a pinned-only transaction.
    /// Individual failures are logged and skipped so the loop always
    /// completes and the flag is always restored.
    fn rewrite_dock(&self, remove: &[String], add: &[String]) -> usize {
        debug!(
            "Rewriting dock: removing {} item(s), adding {} item(s)",
            remove.len(),
            add.len()
        );

        self.toggle.run(self.prefs.as_ref(), || {
            let mut issued = 0;
            for uri in remove {
                issued += 1;
                if let Err(e) = self.dock.remove(uri) {
                    warn!("Failed to remove {} from the dock: {}", uri, e);
                }
            }
            for uri in add {
                issued += 1;
                if let Err(e) = self.dock.add(uri) {
                    warn!("Failed to add {} to the dock: {}", uri, e);
                }
            }
            issued
        })
    }

    fn pull_from_dock(&self, favorites: &[String], dock: &[String]) -> Result<usize> {
        let edits = plan_favorites_update(favorites, dock);
        for edit in &edits {
            match edit {
                FavoritesEdit::Append(uri) => {
                    debug!("Adding {} to favorites", uri);
                    self.favorites.add_at(desktop_id_from_uri(uri), None)?;
                }
                FavoritesEdit::Remove(uri) => {
                    debug!("Removing {} from favorites", uri);
                    self.favorites.remove(desktop_id_from_uri(uri))?;
                }
                FavoritesEdit::Move { .. } => {}
            }
        }
        Ok(edits.len())
    }

    fn reorder(&self, favorites: &[String], dock_order: &[String]) -> Result<usize> {
        let moves = plan_reorder(favorites, dock_order);
        for edit in &moves {
            if let FavoritesEdit::Move { uri, pos } = edit {
                debug!("Moving {} to position {}", uri, pos);
                self.favorites.move_to(desktop_id_from_uri(uri), *pos)?;
            }
        }
        Ok(moves.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_dock_update_in_sync() {
        assert_eq!(
            plan_dock_update(&uris(&["a", "b"]), &uris(&["a", "b"])),
            DockPlan::InSync
        );
        assert_eq!(plan_dock_update(&[], &[]), DockPlan::InSync);
    }

    #[test]
    fn test_plan_dock_update_single_append() {
        assert_eq!(
            plan_dock_update(&uris(&["a", "b", "c"]), &uris(&["a", "b"])),
            DockPlan::Append("c".to_string())
        );
        assert_eq!(
            plan_dock_update(&uris(&["a"]), &[]),
            DockPlan::Append("a".to_string())
        );
    }

    #[test]
    fn test_plan_dock_update_reorder_rebuilds() {
        assert_eq!(
            plan_dock_update(&uris(&["b", "a"]), &uris(&["a", "b"])),
            DockPlan::Rebuild {
                remove: uris(&["a", "b"]),
                add: uris(&["b", "a"]),
            }
        );
    }

    #[test]
    fn test_plan_dock_update_removal_rebuilds() {
        let plan = plan_dock_update(&uris(&["a"]), &uris(&["a", "b"]));
        assert!(matches!(plan, DockPlan::Rebuild { .. }));

        let plan = plan_dock_update(&[], &uris(&["a"]));
        assert_eq!(
            plan,
            DockPlan::Rebuild {
                remove: uris(&["a"]),
                add: Vec::new(),
            }
        );
    }

    #[test]
    fn test_plan_dock_update_insert_in_middle_rebuilds() {
        let plan = plan_dock_update(&uris(&["a", "x", "b"]), &uris(&["a", "b"]));
        assert!(matches!(plan, DockPlan::Rebuild { .. }));
    }

    #[test]
    fn test_plan_favorites_update() {
        let edits = plan_favorites_update(&uris(&["a", "b"]), &uris(&["b", "c"]));
        assert_eq!(
            edits,
            vec![
                FavoritesEdit::Append("c".to_string()),
                FavoritesEdit::Remove("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_plan_favorites_update_ignores_order() {
        assert!(plan_favorites_update(&uris(&["a", "b"]), &uris(&["b", "a"])).is_empty());
    }

    #[test]
    fn test_plan_reorder_rotation() {
        let moves = plan_reorder(&uris(&["a", "b", "c"]), &uris(&["c", "a", "b"]));
        assert_eq!(
            moves,
            vec![FavoritesEdit::Move {
                uri: "c".to_string(),
                pos: 0
            }]
        );
    }

    #[test]
    fn test_plan_reorder_reversal_uses_live_indices() {
        let moves = plan_reorder(&uris(&["a", "b", "c", "d"]), &uris(&["d", "c", "b", "a"]));
        assert_eq!(
            moves,
            vec![
                FavoritesEdit::Move { uri: "d".to_string(), pos: 0 },
                FavoritesEdit::Move { uri: "c".to_string(), pos: 1 },
                FavoritesEdit::Move { uri: "b".to_string(), pos: 2 },
            ]
        );
    }

    #[test]
    fn test_plan_reorder_skips_unknown_items() {
        let moves = plan_reorder(&uris(&["a", "c"]), &uris(&["c", "x", "a"]));
        assert_eq!(
            moves,
            vec![FavoritesEdit::Move {
                uri: "c".to_string(),
                pos: 0
            }]
        );
    }

    #[test]
    fn test_plan_reorder_already_ordered() {
        assert!(plan_reorder(&uris(&["a", "b"]), &uris(&["a", "b"])).is_empty());
        assert!(plan_reorder(&[], &uris(&["a"])).is_empty());
    }

    #[test]
    fn test_outcome_mutations() {
        assert_eq!(SyncOutcome::Applied { mutations: 3 }.mutations(), 3);
        assert_eq!(SyncOutcome::Busy.mutations(), 0);
    }
}
