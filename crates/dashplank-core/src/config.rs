//! Configuration types and parsing.
//!
//! The `Config` type is the on-disk schema: plain, serialization-friendly
//! values. Anything derived from the live dock settings (theme parameters,
//! URIs) is computed elsewhere.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use toml::Table;

use crate::error::{Error, Result};
use crate::transaction::RestorePolicy;

/// Known valid values for sync.pinned_only_restore.
const VALID_RESTORE_POLICIES: &[&str] = &["previous", "activation"];

/// Bootstrap retries faster than this would hammer the dock while it starts.
const MIN_INIT_RETRY_MS: u64 = 50;

/// Embedded default configuration TOML, compiled into the binary.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config.toml");

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path where config was found, if any.
    pub source: Option<PathBuf>,
    /// Whether defaults were used (no config file found).
    pub used_defaults: bool,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which dock to talk to and how.
    pub dock: DockConfig,

    /// Where the shell keeps its favorites.
    pub favorites: FavoritesConfig,

    /// Reconciliation behaviour.
    pub sync: SyncConfig,

    /// Generated dock theme.
    pub theme: ThemeConfig,

    /// The "all applications" pseudo-item.
    pub launcher: LauncherConfig,
}

impl Config {
    /// Load configuration from the embedded default TOML string.
    pub fn from_default_toml() -> Result<Self> {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, merging with embedded defaults.
    ///
    /// Returns an error if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_with_defaults(&content)
    }

    /// Parse a TOML string, deep-merging it over the embedded defaults
    /// (user values win).
    fn load_with_defaults(user_toml: &str) -> Result<Self> {
        let mut base: Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let user: Table = toml::from_str(user_toml)?;

        deep_merge_toml(&mut base, user);

        let config: Config = base.try_into()?;
        Ok(config)
    }

    /// Find and load configuration using the XDG lookup chain.
    ///
    /// An explicit path is used strictly (no fallback). Otherwise searches
    /// in order:
    /// 1. `$XDG_CONFIG_HOME/dashplank/config.toml`
    /// 2. `~/.config/dashplank/config.toml`
    /// 3. `./config.toml`
    ///
    /// A file that exists but fails to load is an error; defaults are only
    /// used when no file exists at all.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<ConfigLoadResult> {
        if let Some(path) = explicit_path {
            let config = Self::load(path)?;
            return Ok(ConfigLoadResult {
                config,
                source: Some(path.to_path_buf()),
                used_defaults: false,
            });
        }

        let search_paths = Self::config_search_paths();
        let mut first_error: Option<(PathBuf, Error)> = None;

        for path in &search_paths {
            if !path.exists() {
                continue;
            }
            match Self::load(path) {
                Ok(config) => {
                    return Ok(ConfigLoadResult {
                        config,
                        source: Some(path.clone()),
                        used_defaults: false,
                    });
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some((path.clone(), e));
                    }
                }
            }
        }

        if let Some((path, error)) = first_error {
            tracing::error!(
                "Config file {:?} exists but failed to load: {}",
                path,
                error
            );
            return Err(error);
        }

        tracing::info!("No config file found, using built-in default config");
        tracing::debug!(
            "Searched: {}",
            search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ConfigLoadResult {
            config: Self::from_default_toml()?,
            source: None,
            used_defaults: true,
        })
    }

    /// Get the list of paths to search for config files.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("dashplank/config.toml"));
        }

        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/dashplank/config.toml"));
        }

        paths.push(PathBuf::from("config.toml"));

        paths
    }

    /// Validate the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.dock.id.trim().is_empty() {
            errors.push("dock.id: must not be empty".to_string());
        } else if self.dock.id.contains('/') {
            errors.push(format!(
                "dock.id: invalid value '{}', must not contain '/'",
                self.dock.id
            ));
        }

        if self.dock.bus_name.trim().is_empty() {
            errors.push("dock.bus_name: must not be empty".to_string());
        }

        if !self.dock.settings_path_prefix.starts_with('/')
            || !self.dock.settings_path_prefix.ends_with('/')
        {
            errors.push(format!(
                "dock.settings_path_prefix: invalid value '{}', must start and end with '/'",
                self.dock.settings_path_prefix
            ));
        }

        if self.dock.call_timeout_ms < -1 {
            errors.push(format!(
                "dock.call_timeout_ms: invalid value '{}', use -1 for the bus default",
                self.dock.call_timeout_ms
            ));
        }

        if self.favorites.schema.trim().is_empty() || self.favorites.key.trim().is_empty() {
            errors.push("favorites: schema and key must not be empty".to_string());
        }

        if !VALID_RESTORE_POLICIES.contains(&self.sync.pinned_only_restore.as_str()) {
            errors.push(format!(
                "sync.pinned_only_restore: invalid value '{}', expected one of: {}",
                self.sync.pinned_only_restore,
                VALID_RESTORE_POLICIES.join(", ")
            ));
        }

        if self.sync.init_retry_ms < MIN_INIT_RETRY_MS {
            errors.push(format!(
                "sync.init_retry_ms: must be at least {}",
                MIN_INIT_RETRY_MS
            ));
        }

        if self.theme.name.trim().is_empty() || self.theme.name.contains('/') {
            errors.push(format!(
                "theme.name: invalid value '{}', must be a non-empty directory name",
                self.theme.name
            ));
        }

        if self.launcher.id.trim().is_empty() {
            errors.push("launcher.id: must not be empty".to_string());
        } else if self.launcher.id.contains('/') {
            errors.push(format!(
                "launcher.id: invalid value '{}', must not contain '/'",
                self.launcher.id
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation(errors))
        }
    }

    /// Settings path of the configured dock, e.g.
    /// `/net/launchpad/plank/docks/dock1/`.
    pub fn dock_settings_path(&self) -> String {
        format!("{}{}/", self.dock.settings_path_prefix, self.dock.id)
    }

    /// How the pinned-only flag is restored after a full rewrite.
    pub fn restore_policy(&self) -> RestorePolicy {
        match self.sync.pinned_only_restore.as_str() {
            "activation" => RestorePolicy::Activation,
            _ => RestorePolicy::Previous,
        }
    }

    /// Human-readable summary of the configuration.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Dock:".to_string());
        lines.push(format!("  id: {}", self.dock.id));
        lines.push(format!("  bus_name: {}", self.dock.bus_name));
        lines.push(format!("  settings: {}", self.dock_settings_path()));
        if self.dock.command.is_empty() {
            lines.push("  command: (not spawned)".to_string());
        } else {
            lines.push(format!("  command: {}", self.dock.command));
        }

        lines.push("\nFavorites:".to_string());
        lines.push(format!(
            "  {} {}",
            self.favorites.schema, self.favorites.key
        ));

        lines.push("\nSync:".to_string());
        lines.push(format!(
            "  pinned_only_restore: {}",
            self.sync.pinned_only_restore
        ));
        lines.push(format!("  init_retry: {}ms", self.sync.init_retry_ms));

        lines.push("\nTheme:".to_string());
        lines.push(format!("  name: {}", self.theme.name));
        lines.push(format!("  panel_height: {}px", self.theme.panel_height));

        lines.push("\nLauncher:".to_string());
        lines.push(format!(
            "  {} ({})",
            self.launcher.id,
            if self.launcher.enabled {
                "enabled"
            } else {
                "disabled"
            }
        ));

        lines.join("\n")
    }
}

/// Deep merge two TOML tables, with `overlay` values taking precedence.
///
/// Nested tables merge recursively; any other value is replaced outright.
fn deep_merge_toml(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge_toml(base_table, overlay_table);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Dock process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DockConfig {
    /// Dock instance name, used in bus paths and the settings path.
    pub id: String,
    /// Well-known bus name of the dock.
    pub bus_name: String,
    /// GSettings schema of a dock instance.
    pub settings_schema: String,
    /// Relocatable settings path prefix; the dock id is appended.
    pub settings_path_prefix: String,
    /// Command used to start the dock when it is not running.
    pub command: String,
    /// Bus call timeout in milliseconds, -1 for the bus default.
    pub call_timeout_ms: i32,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            id: "dock1".to_string(),
            bus_name: "net.launchpad.plank".to_string(),
            settings_schema: "net.launchpad.plank.dock.settings".to_string(),
            settings_path_prefix: "/net/launchpad/plank/docks/".to_string(),
            command: "plank".to_string(),
            call_timeout_ms: 5000,
        }
    }
}

/// Location of the shell's favorites list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FavoritesConfig {
    pub schema: String,
    pub key: String,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            schema: "org.gnome.shell".to_string(),
            key: "favorite-apps".to_string(),
        }
    }
}

/// Reconciliation behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// "previous" or "activation".
    pub pinned_only_restore: String,
    /// Interval between bootstrap attempts in milliseconds.
    pub init_retry_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pinned_only_restore: "previous".to_string(),
            init_retry_ms: 200,
        }
    }
}

/// Generated dock theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Theme directory name, also written to the dock's `theme` key.
    pub name: String,
    /// Height of the shell's top panel in pixels.
    pub panel_height: u32,
    /// Whether `IndicatorSize` is written.
    pub indicator: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "DashToPlank".to_string(),
            panel_height: 32,
            indicator: true,
        }
    }
}

/// The "all applications" pseudo-item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    pub enabled: bool,
    pub id: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id: "net.launchpad.plank.AppsLauncher".to_string(),
        }
    }
}
