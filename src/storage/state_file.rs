//! Persistence adapters for the bike state snapshot.

use std::path::{Path, PathBuf};

use crate::state::BikeState;

/// File name of the persisted snapshot inside the data directory.
pub const STATE_FILE_NAME: &str = "ride-the-bike-storage.json";

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Load-at-startup, save-on-mutation persistence for [`BikeState`].
pub trait StateStore {
    /// Read the last snapshot. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<BikeState>, StoreError>;

    /// Replace the snapshot.
    fn save(&mut self, state: &BikeState) -> Result<(), StoreError>;
}

/// Snapshot stored as a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard file name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STATE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<BikeState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let mut state = parse_snapshot(&content)?;
        state.normalize();

        Ok(Some(state))
    }

    fn save(&mut self, state: &BikeState) -> Result<(), StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(state)?;

        // Write beside the target and rename so a crash never leaves half a file
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

/// Parse a snapshot, either flat or wrapped as `{"state": {...}, "version": n}`
/// the way browser exports store it.
fn parse_snapshot(content: &str) -> Result<BikeState, StoreError> {
    let mut value: serde_json::Value = serde_json::from_str(content)?;

    if let Some(inner) = value.get_mut("state").filter(|s| s.is_object()) {
        let inner = inner.take();
        return Ok(serde_json::from_value(inner)?);
    }

    Ok(serde_json::from_value(value)?)
}

/// In-memory store, used by tests and for throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<BikeState>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    pub fn with_state(state: BikeState) -> Self {
        Self {
            snapshot: Some(state),
            ..Default::default()
        }
    }

    /// Make every subsequent save fail until turned off again.
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn snapshot(&self) -> Option<&BikeState> {
        self.snapshot.as_ref()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<BikeState>, StoreError> {
        Ok(self.snapshot.clone().map(|mut state| {
            state.normalize();
            state
        }))
    }

    fn save(&mut self, state: &BikeState) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(StoreError::Unavailable("memory store is read-only".to_string()));
        }
        self.snapshot = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}
