mod config;
mod sqlite;

pub use config::{CalendarConfig, Config, RemindersConfig, SleepConfig};
pub use sqlite::{SqliteStore, TRACKER_DATA_KEY};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{Result, StorageError};

/// Returns `~/.config/lifelog[-dev]/` based on LIFELOG_ENV.
///
/// Set LIFELOG_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LIFELOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lifelog-dev")
    } else {
        base_dir.join("lifelog")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Durable home of the serialized [`crate::TrackerData`] document.
///
/// The tracker only ever reads the whole document at startup and writes the
/// whole document after a mutation.
pub trait PersistenceStore: Send {
    /// The last saved document, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, document: &str) -> Result<()>;
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `document`.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(document.into()))),
        }
    }

    pub fn document(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.document())
    }

    fn save(&self, document: &str) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(document.to_string());
        Ok(())
    }
}
