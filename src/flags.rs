use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, warn};

const TRUE: &str = "true";

/// Durable per-profile booleans such as "has voted".
///
/// Reads default to `false`. Storage trouble never surfaces as an error: an
/// unreadable store reads as empty and a failed write is dropped.
pub trait FlagStore: Send + Sync {
    fn get(&self, key: &str) -> bool;
    fn set(&self, key: &str, value: bool);
}

/// Flags kept as a JSON object of string values in one file.
pub struct FileFlagStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileFlagStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(entries)?;
        fs::write(&self.path, payload)
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> bool {
        self.entries.lock().get(key).is_some_and(|value| value == TRUE)
    }

    fn set(&self, key: &str, value: bool) {
        let mut entries = self.entries.lock();
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        match self.persist(&updated) {
            Ok(()) => {
                *entries = updated;
                debug!(key, value, path = %self.path.display(), "flag stored");
            }
            Err(err) => warn!(key, path = %self.path.display(), "failed to store flag: {err}"),
        }
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), "failed to parse flag file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            warn!(path = %path.display(), "failed to read flag file: {err}");
            BTreeMap::new()
        }
    }
}

/// In-memory flags. Clones share the same entries, like tabs of one browser profile.
#[derive(Clone, Default)]
pub struct MemoryFlagStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> bool {
        self.entries.lock().get(key).is_some_and(|value| value == TRUE)
    }

    fn set(&self, key: &str, value: bool) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }
}
