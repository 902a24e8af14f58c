//! Identity mapping between shell desktop ids, dock item files and the
//! canonical `file://` URIs both sides are compared by.

use std::path::Path;
use std::rc::Rc;

use tracing::trace;

use crate::store::AppLookup;

const URI_SCHEME: &str = "file://";
const DESKTOP_SUFFIX: &str = ".desktop";
const DOCKITEM_SUFFIX: &str = ".dockitem";

/// Canonical URI of a desktop file: `file://` followed by its path.
pub fn file_uri(path: &Path) -> String {
    format!("{}{}", URI_SCHEME, path.display())
}

/// Desktop-entry id of a URI (its last path segment).
pub fn desktop_id_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// `firefox.dockitem` -> `firefox.desktop`. Names without the dock item
/// suffix are returned unchanged.
pub fn dockitem_to_desktop_id(item: &str) -> String {
    match item.strip_suffix(DOCKITEM_SUFFIX) {
        Some(stem) => format!("{}{}", stem, DESKTOP_SUFFIX),
        None => item.to_string(),
    }
}

/// Translates between the shell's and the dock's identifiers.
pub struct IdentityMapper {
    lookup: Rc<dyn AppLookup>,
    launcher_id: String,
    launcher_uri: String,
}

impl IdentityMapper {
    /// `launcher_id` is the launcher's base name without suffix and
    /// `launcher_file` the desktop file installed for it.
    pub fn new(lookup: Rc<dyn AppLookup>, launcher_id: &str, launcher_file: &Path) -> Self {
        Self {
            lookup,
            launcher_id: launcher_id.to_string(),
            launcher_uri: file_uri(launcher_file),
        }
    }

    /// URI of an installed application, or `None` if it cannot be resolved.
    pub fn app_uri(&self, desktop_id: &str) -> Option<String> {
        let uri = self.lookup.desktop_file(desktop_id).map(|p| file_uri(&p));
        if uri.is_none() {
            trace!("No desktop file for '{}'", desktop_id);
        }
        uri
    }

    /// URI of the application behind a dock item file.
    pub fn item_uri(&self, dockitem: &str) -> Option<String> {
        self.app_uri(&dockitem_to_desktop_id(dockitem))
    }

    /// URIs of the given desktop ids, dropping any that do not resolve.
    pub fn app_uris<S: AsRef<str>>(&self, desktop_ids: &[S]) -> Vec<String> {
        desktop_ids
            .iter()
            .filter_map(|id| self.app_uri(id.as_ref()))
            .collect()
    }

    /// URIs of the given dock item files, without the launcher and without
    /// items that do not resolve.
    pub fn item_uris<S: AsRef<str>>(&self, dockitems: &[S]) -> Vec<String> {
        dockitems
            .iter()
            .filter(|item| !self.is_launcher_item(item.as_ref()))
            .filter_map(|item| self.item_uri(item.as_ref()))
            .filter(|uri| !self.is_launcher(uri))
            .collect()
    }

    /// Whether `uri` names the launcher pseudo-entry.
    pub fn is_launcher(&self, uri: &str) -> bool {
        desktop_id_from_uri(uri)
            .strip_suffix(DESKTOP_SUFFIX)
            .is_some_and(|stem| stem == self.launcher_id)
    }

    /// Whether a dock item file is the launcher's.
    pub fn is_launcher_item(&self, dockitem: &str) -> bool {
        dockitem == self.launcher_dockitem()
    }

    /// Drop the launcher from a list of dock URIs.
    pub fn without_launcher(&self, uris: Vec<String>) -> Vec<String> {
        uris.into_iter().filter(|u| !self.is_launcher(u)).collect()
    }

    pub fn launcher_uri(&self) -> &str {
        &self.launcher_uri
    }

    /// Dock item filename the dock creates for the launcher.
    pub fn launcher_dockitem(&self) -> String {
        format!("{}{}", self.launcher_id, DOCKITEM_SUFFIX)
    }
}
