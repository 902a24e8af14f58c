//! Error types shared by the core and the daemon.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout dashplank.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    ConfigValidation(Vec<String>),

    /// A dock bus call failed or the reply had an unexpected shape.
    #[error("{method} failed: {message}")]
    Bus { method: String, message: String },

    /// The dock answered `false` to an Add/Remove call.
    #[error("dock refused to {action} {uri}")]
    DockRejected { action: &'static str, uri: String },

    #[error("failed to write setting '{key}': {message}")]
    Settings { key: String, message: String },

    #[error("favorites: {0}")]
    Favorites(String),

    #[error("icon size must be greater than 0 (got {0})")]
    InvalidIconSize(i32),

    #[error("invalid dock {kind} '{value}'")]
    InvalidLayout { kind: &'static str, value: String },

    /// Another reconciliation holds the guard.
    #[error("a reconciliation is already running")]
    Busy,

    #[error("dock is not connected")]
    Disconnected,

    /// A schema, settings path or other install-time resource is absent.
    #[error("{0} could not be found; please check your installation")]
    MissingResource(String),
}

impl Error {
    /// Build a [`Error::Bus`] from any displayable transport error.
    pub fn bus(method: &str, err: impl std::fmt::Display) -> Self {
        Self::Bus {
            method: method.to_string(),
            message: err.to_string(),
        }
    }

    /// Build a [`Error::Settings`] from any displayable backend error.
    pub fn settings(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Settings {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}
