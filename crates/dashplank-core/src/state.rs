//! Persistent daemon state (`$XDG_STATE_HOME/dashplank/state.toml`).

use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::store::InitFlagStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// The first-run bootstrap has completed.
    pub initialized: bool,
    /// RFC 3339 timestamp of the bootstrap.
    pub initialized_at: Option<String>,
}

/// TOML-backed [`InitFlagStore`].
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    state: RefCell<PersistedState>,
}

impl StateFile {
    /// `$XDG_STATE_HOME/dashplank/state.toml`, falling back to
    /// `~/.local/state/dashplank/state.toml`.
    pub fn default_path() -> PathBuf {
        if let Ok(dir) = env::var("XDG_STATE_HOME")
            && !dir.is_empty()
        {
            return PathBuf::from(dir).join("dashplank/state.toml");
        }
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(".local/state/dashplank/state.toml");
        }
        PathBuf::from("dashplank-state.toml")
    }

    /// Open the state at `path`. A missing file is a fresh state; an
    /// unreadable one is logged and treated the same way.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match Self::read(&path) {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("No state file at {}", path.display());
                PersistedState::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable state file {}: {}", path.display(), e);
                PersistedState::default()
            }
        };
        Self {
            path,
            state: RefCell::new(state),
        }
    }

    fn read(path: &Path) -> Result<Option<PersistedState>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(toml::from_str(&content)?))
    }

    pub fn snapshot(&self) -> PersistedState {
        self.state.borrow().clone()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(&*self.state.borrow())?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl InitFlagStore for StateFile {
    fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    fn mark_initialized(&self) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            state.initialized = true;
            state.initialized_at = Some(chrono::Local::now().to_rfc3339());
        }
        self.save()
    }
}
