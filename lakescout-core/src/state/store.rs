//! Run state persistence.

use super::{RunState, StateKey};
use crate::error::CrawlError;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Loads and saves one [`RunState`] per [`StateKey`].
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Previous state, or `None` on the first run.
    async fn load(&self, key: &StateKey) -> Result<Option<RunState>>;

    /// Replaces the stored state for `key`.
    async fn save(&self, key: &StateKey, state: &RunState) -> Result<()>;
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Store rooted at `dir`; created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the state for `key`.
    pub fn path_for(&self, key: &StateKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, key: &StateKey) -> Result<Option<RunState>> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No previous state at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(CrawlError::state(
                    format!("Failed to read {}", path.display()),
                    e,
                ));
            }
        };

        let state: RunState = serde_json::from_str(&raw)
            .map_err(|e| CrawlError::state(format!("Corrupt state file {}", path.display()), e))?;
        tracing::debug!(
            "Loaded state with {} entities from run {}",
            state.len(),
            state.run_id
        );
        Ok(Some(state))
    }

    /// Writes to a temporary file and renames it over the target.
    async fn save(&self, key: &StateKey, state: &RunState) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CrawlError::state(format!("Failed to create {}", self.dir.display()), e)
        })?;

        let path = self.path_for(key);
        let temp_path = path.with_extension(format!("json.{}.tmp", std::process::id()));
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| CrawlError::serialization("Failed to serialize run state", e))?;

        tokio::fs::write(&temp_path, json).await.map_err(|e| {
            CrawlError::state(format!("Failed to write {}", temp_path.display()), e)
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CrawlError::state(
                format!("Failed to replace {}", path.display()),
                e,
            ));
        }

        tracing::debug!("Saved state with {} entities to {}", state.len(), path.display());
        Ok(())
    }
}

/// In-process store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<StateKey, RunState>>,
}

impl MemoryStateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, key: &StateKey) -> Result<Option<RunState>> {
        Ok(self.states.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &StateKey, state: &RunState) -> Result<()> {
        self.states.lock().await.insert(key.clone(), state.clone());
        Ok(())
    }
}
