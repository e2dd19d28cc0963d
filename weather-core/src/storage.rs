use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::config::Config;

/// Single-slot durable store for the last searched location.
pub trait LocationStore: Send {
    fn last_location(&self) -> Result<Option<String>>;
    fn remember(&mut self, location: &str) -> Result<()>;
}

/// Keeps the slot in memory only; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocationStore {
    last: Option<String>,
}

impl MemoryLocationStore {
    pub fn with_last_location(location: impl Into<String>) -> Self {
        Self { last: Some(location.into()) }
    }
}

impl LocationStore for MemoryLocationStore {
    fn last_location(&self) -> Result<Option<String>> {
        Ok(self.last.clone())
    }

    fn remember(&mut self, location: &str) -> Result<()> {
        self.last = Some(location.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredState {
    #[serde(rename = "lastLocation", default, skip_serializing_if = "Option::is_none")]
    last_location: Option<String>,
}

/// JSON file in the platform data directory.
#[derive(Debug, Clone)]
pub struct FileLocationStore {
    path: PathBuf,
}

impl FileLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default per-user location.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::state_file_path()?))
    }

    fn read_state(&self) -> Result<StoredState> {
        if !self.path.exists() {
            return Ok(StoredState::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))
    }
}

impl LocationStore for FileLocationStore {
    fn last_location(&self) -> Result<Option<String>> {
        Ok(self.read_state()?.last_location)
    }

    fn remember(&mut self, location: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let state = StoredState { last_location: Some(location.to_string()) };
        let json = serde_json::to_string_pretty(&state).context("Failed to serialize state")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))
    }
}
