//! Configuration storage
//!
//! The coordinator treats persistence as a black box behind [`ConfigStore`].
//! Two implementations ship with the crate: a JSON file guarded by an advisory
//! lock file, and a shared in-memory store.

use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::ConsoleError;
use crate::model::Config;

/// Loads and saves the whole configuration tree.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<Config, ConsoleError>;

    fn save(&self, config: &Config) -> Result<(), ConsoleError>;
}

/// JSON document on disk.
///
/// Readers and writers coordinate through `<path>.lock` so concurrent console
/// processes never observe a half-written file; writes go to a temporary file
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open_lock_file(&self) -> std::io::Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path())
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<Config, ConsoleError> {
        let read_err = |e: std::io::Error| {
            ConsoleError::StoreRead(format!("{}: {e}", self.path.display()))
        };

        let lock_file = self.open_lock_file().map_err(read_err)?;
        let lock = RwLock::new(lock_file);
        let _guard = lock.read().map_err(read_err)?;

        if !self.path.exists() {
            info!(path = %self.path.display(), "No configuration file yet, starting empty");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.path).map_err(read_err)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConsoleError::StoreRead(format!("{}: {e}", self.path.display())))?;
        debug!(
            path = %self.path.display(),
            environments = config.environments.len(),
            agents = config.agents.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<(), ConsoleError> {
        let write_err = |e: std::io::Error| {
            ConsoleError::StoreWrite(format!("{}: {e}", self.path.display()))
        };

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ConsoleError::StoreWrite(e.to_string()))?;

        let lock_file = self.open_lock_file().map_err(write_err)?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock.write().map_err(write_err)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut tmp = File::create(&tmp_path).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.sync_all().map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        debug!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}

/// Process-local store; clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Config>>,
}

impl InMemoryStore {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    /// Copy of what is currently stored.
    pub fn snapshot(&self) -> Config {
        self.inner
            .lock()
            .map(|config| config.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ConfigStore for InMemoryStore {
    fn load(&self) -> Result<Config, ConsoleError> {
        self.inner
            .lock()
            .map(|config| config.clone())
            .map_err(|e| ConsoleError::StoreRead(e.to_string()))
    }

    fn save(&self, config: &Config) -> Result<(), ConsoleError> {
        let mut stored = self
            .inner
            .lock()
            .map_err(|e| ConsoleError::StoreWrite(e.to_string()))?;
        *stored = config.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Agent, Environment};

    fn sample() -> Config {
        Config {
            environments: vec![Environment::new("prod").with_agent("a1")],
            agents: vec![Agent::new("a1", "prod-host", 4000)],
        }
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("config.json"));

        assert_eq!(store.load().unwrap(), Config::default());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn corrupt_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConsoleError::StoreRead(_)));
    }

    #[test]
    fn in_memory_clones_share_state() {
        let store = InMemoryStore::default();
        let other = store.clone();
        store.save(&sample()).unwrap();
        assert_eq!(other.load().unwrap(), sample());
        assert_eq!(other.snapshot(), sample());
    }
}
