//! Key/value settings persisted as `key=value` lines.
//!
//! Loading tolerates malformed lines; saving is best-effort. A settings file
//! that cannot be read or written never blocks the gateway.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::config;

const SETTINGS_FILE: &str = "settings.dat";

pub struct SettingsStore {
    values: Mutex<HashMap<String, String>>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Open the store backed by the per-app data directory, falling back to
    /// in-memory values when the directory is unavailable.
    pub fn open() -> Self {
        match settings_path() {
            Ok(path) => Self::with_path(path),
            Err(e) => {
                warn!(error = %e, "settings persistence unavailable, running in memory");
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            path: None,
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            values: Mutex::new(load(&path)),
            path: Some(path),
        }
    }

    pub fn get(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.into(), value.into());
        self.persist(&values);
    }

    fn persist(&self, values: &HashMap<String, String>) {
        let Some(path) = &self.path else { return };
        let mut buf = String::new();
        for (key, value) in values {
            buf.push_str(key);
            buf.push('=');
            buf.push_str(value);
            buf.push('\n');
        }
        if let Err(e) = fs::write(path, buf) {
            warn!(path = %path.display(), error = %e, "failed to persist settings");
        }
    }
}

fn settings_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("no data directory for this platform"))?
        .join(config::APP_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(SETTINGS_FILE))
}

fn load(path: &Path) -> HashMap<String, String> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    raw.lines()
        .filter_map(|line| {
            line.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}
