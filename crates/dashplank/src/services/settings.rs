//! GSettings access shared by the favorites and dock services.

use gtk4::gio::{self, prelude::*};
use tracing::debug;

use dashplank_core::{Error, Result};

/// Open `schema_id`, relocated to `path` when given.
///
/// `gio::Settings::new` aborts the process on an unknown schema, so the
/// schema is looked up first and reported as a missing resource instead.
pub fn open(schema_id: &str, path: Option<&str>) -> Result<gio::Settings> {
    let source = gio::SettingsSchemaSource::default()
        .ok_or_else(|| Error::MissingResource("GSettings schema source".to_string()))?;
    let schema = source
        .lookup(schema_id, true)
        .ok_or_else(|| Error::MissingResource(format!("GSettings schema '{}'", schema_id)))?;

    if path.is_none() && schema.path().is_none() {
        return Err(Error::MissingResource(format!(
            "settings path for relocatable schema '{}'",
            schema_id
        )));
    }

    debug!("Opening settings {} at {:?}", schema_id, path);
    Ok(gio::Settings::new_full(
        &schema,
        None::<&gio::SettingsBackend>,
        path,
    ))
}

/// Whether `key` exists in the settings' schema.
pub fn has_key(settings: &gio::Settings, key: &str) -> bool {
    settings
        .settings_schema()
        .is_some_and(|schema| schema.has_key(key))
}

pub fn strv(settings: &gio::Settings, key: &str) -> Vec<String> {
    settings
        .strv(key)
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

pub fn set_strv(settings: &gio::Settings, key: &str, values: &[String]) -> Result<()> {
    let values: Vec<&str> = values.iter().map(String::as_str).collect();
    settings
        .set_strv(key, values.as_slice())
        .map_err(|e| Error::settings(key, e))
}
