//! A small JSON-file store for saved scripts and the device-path setting.
//!
//! The file holds:
//!
//! ```json
//! {
//!   "device_path": "/dev/hidg0",
//!   "scripts": [{ "id": "...", "name": "hello", "content": "STRING hello" }]
//! }
//! ```

use crate::error::{Error, Result};
use crate::hid::DEFAULT_DEVICE_PATH;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A saved script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
}

impl Script {
    /// Create a script with a fresh random id.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: format!("{:032x}", rand::random::<u128>()),
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_path: Option<PathBuf>,
    #[serde(default)]
    scripts: Vec<Script>,
}

/// Scripts and settings persisted in a single JSON file.
///
/// Every operation reads the file afresh; there is no in-memory cache.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    path: PathBuf,
}

impl ScriptStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.config/duckhid/scripts.json`, or `./duckhid-scripts.json` without a home directory.
    pub fn default_path() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) => Path::new(&home).join(".config/duckhid/scripts.json"),
            None => PathBuf::from("duckhid-scripts.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved scripts, in insertion order.
    pub fn scripts(&self) -> Result<Vec<Script>> {
        Ok(self.load()?.scripts)
    }

    pub fn get(&self, id: &str) -> Result<Option<Script>> {
        Ok(self.load()?.scripts.into_iter().find(|s| s.id == id))
    }

    /// Look a script up by id, falling back to the first one with a matching name.
    pub fn find(&self, id_or_name: &str) -> Result<Option<Script>> {
        let scripts = self.load()?.scripts;
        let by_id = scripts.iter().position(|s| s.id == id_or_name);
        let idx = by_id.or_else(|| scripts.iter().position(|s| s.name == id_or_name));
        Ok(idx.map(|i| scripts[i].clone()))
    }

    pub fn add(&self, script: Script) -> Result<()> {
        let mut data = self.load()?;
        data.scripts.push(script);
        self.save(&data)
    }

    /// Replace the script with the same id. Returns `false` if there is none.
    pub fn update(&self, script: Script) -> Result<bool> {
        let mut data = self.load()?;
        let Some(slot) = data.scripts.iter_mut().find(|s| s.id == script.id) else {
            return Ok(false);
        };
        *slot = script;
        self.save(&data)?;
        Ok(true)
    }

    /// Remove the script with `id`. Returns `false` if there is none.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut data = self.load()?;
        let before = data.scripts.len();
        data.scripts.retain(|s| s.id != id);
        if data.scripts.len() == before {
            return Ok(false);
        }
        self.save(&data)?;
        Ok(true)
    }

    /// The persisted device path, or [`DEFAULT_DEVICE_PATH`].
    pub fn device_path(&self) -> Result<PathBuf> {
        Ok(self
            .load()?
            .device_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEVICE_PATH)))
    }

    pub fn set_device_path(&self, path: impl Into<PathBuf>) -> Result<()> {
        let mut data = self.load()?;
        data.device_path = Some(path.into());
        self.save(&data)
    }

    /// Read the store. A missing file is an empty store; an unparseable one is
    /// treated as empty too, with a warning.
    fn load(&self) -> Result<StoreData> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreData::default()),
            Err(e) => return Err(Error::store(&self.path, e)),
        };
        match serde_json::from_str(&content) {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable script store, ignoring");
                Ok(StoreData::default())
            }
        }
    }

    fn save(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::store(parent, e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| Error::store(&self.path, e))?;
        debug!(path = %self.path.display(), scripts = data.scripts.len(), "store saved");
        Ok(())
    }
}
