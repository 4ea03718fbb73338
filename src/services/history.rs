//! Bounded, append-only conversation log.
//!
//! At most [`MAX_HISTORY`](crate::config::MAX_HISTORY) entries are held; the
//! oldest is evicted first. Persistence is best-effort JSON lines: a plain
//! append adds one line, eviction and clear rewrite the file, and a write
//! failure is logged and never surfaces to the caller.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

use crate::config;
use crate::models::HistoryEntry;

const HISTORY_FILE: &str = "chat_history.jsonl";

pub struct HistoryStore {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl HistoryStore {
    /// Open the process-lifetime store backed by the per-app data directory.
    /// If the directory cannot be resolved or created, the store degrades to
    /// in-memory operation.
    pub fn open() -> Self {
        match history_path() {
            Ok(path) => Self::with_path(path),
            Err(e) => {
                warn!(error = %e, "history persistence unavailable, running in memory");
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: config::MAX_HISTORY,
            path: None,
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        let entries = load(&path, config::MAX_HISTORY);
        if !entries.is_empty() {
            info!(count = entries.len(), "loaded chat history");
        }
        Self {
            entries: Mutex::new(entries),
            capacity: config::MAX_HISTORY,
            path: Some(path),
        }
    }

    /// Append one entry, evicting the oldest when at capacity. Append is the
    /// only mutation; entries are never edited in place.
    pub fn append(&self, content: impl Into<String>, is_user: bool) {
        let entry = HistoryEntry::new(content, is_user);
        let mut entries = self.entries.lock().unwrap();
        let evicted = entries.len() >= self.capacity;
        if evicted {
            entries.pop_front();
        }
        entries.push_back(entry);
        if evicted {
            // The file's head entry is gone, so the whole log is rewritten.
            self.persist(&entries);
        } else if let Some(entry) = entries.back() {
            self.persist_append(entry);
        }
    }

    /// The last `n` entries in insertion order.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().unwrap();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
        self.persist(&entries);
        info!("chat history cleared");
    }

    fn persist(&self, entries: &VecDeque<HistoryEntry>) {
        let Some(path) = &self.path else { return };
        let mut buf = String::new();
        for entry in entries {
            match serde_json::to_string(entry) {
                Ok(line) => {
                    buf.push_str(&line);
                    buf.push('\n');
                }
                Err(e) => warn!(error = %e, "skipping unserializable history entry"),
            }
        }
        if let Err(e) = fs::write(path, buf) {
            warn!(path = %path.display(), error = %e, "failed to persist chat history");
        }
    }

    fn persist_append(&self, entry: &HistoryEntry) {
        let Some(path) = &self.path else { return };
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "skipping unserializable history entry");
                return;
            }
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to persist chat history");
        }
    }
}

fn history_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("no data directory for this platform"))?
        .join(config::APP_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(HISTORY_FILE))
}

fn load(path: &Path, capacity: usize) -> VecDeque<HistoryEntry> {
    let Ok(raw) = fs::read_to_string(path) else {
        return VecDeque::new();
    };
    let mut entries: VecDeque<HistoryEntry> = raw
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    while entries.len() > capacity {
        entries.pop_front();
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_recent_order() {
        let store = HistoryStore::in_memory();
        store.append("hello", true);
        store.append("hi", false);

        let recent = store.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "hello");
        assert!(recent[0].is_user);
        assert_eq!(recent[1].content, "hi");
        assert!(!recent[1].is_user);
        assert!(recent[0].timestamp <= recent[1].timestamp);
    }

    #[test]
    fn test_capacity_bound_and_fifo_eviction() {
        let store = HistoryStore::in_memory();
        for i in 0..config::MAX_HISTORY + 25 {
            store.append(format!("m{i}"), i % 2 == 0);
            assert!(store.len() <= config::MAX_HISTORY);
        }
        assert_eq!(store.len(), config::MAX_HISTORY);

        let recent = store.recent(config::MAX_HISTORY);
        assert_eq!(recent.len(), config::MAX_HISTORY);
        assert_eq!(recent[0].content, "m25");
        assert_eq!(recent.last().unwrap().content, format!("m{}", config::MAX_HISTORY + 24));
    }

    #[test]
    fn test_recent_with_small_n() {
        let store = HistoryStore::in_memory();
        for i in 0..5 {
            store.append(format!("m{i}"), true);
        }
        let recent = store.recent(2);
        assert_eq!(recent[0].content, "m3");
        assert_eq!(recent[1].content, "m4");
    }

    #[test]
    fn test_clear_empties_store() {
        let store = HistoryStore::in_memory();
        store.append("x", true);
        store.clear();
        assert!(store.is_empty());
        assert!(store.recent(10).is_empty());
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("feni-history-{}.jsonl", uuid::Uuid::new_v4()));
        {
            let store = HistoryStore::with_path(path.clone());
            store.append("persisted", true);
            store.append("reply", false);
        }
        let reopened = HistoryStore::with_path(path.clone());
        let recent = reopened.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "persisted");
        assert_eq!(recent[1].content, "reply");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_adds_one_line_without_rewriting() {
        let path = std::env::temp_dir().join(format!("feni-history-{}.jsonl", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json\n").unwrap();

        // A plain append must not rewrite the file: the unparseable line the
        // loader skipped stays in place, with the new entry after it.
        let store = HistoryStore::with_path(path.clone());
        store.append("fresh", true);

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "not json");
        assert!(lines[1].contains("fresh"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_stays_bounded_across_eviction() {
        let path = std::env::temp_dir().join(format!("feni-history-{}.jsonl", uuid::Uuid::new_v4()));
        {
            let store = HistoryStore::with_path(path.clone());
            for i in 0..config::MAX_HISTORY + 5 {
                store.append(format!("m{i}"), true);
            }
        }
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), config::MAX_HISTORY);

        let reopened = HistoryStore::with_path(path.clone());
        assert_eq!(reopened.len(), config::MAX_HISTORY);
        assert_eq!(
            reopened.recent(1)[0].content,
            format!("m{}", config::MAX_HISTORY + 4)
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_malformed_lines_are_skipped_on_load() {
        let path = std::env::temp_dir().join(format!("feni-history-{}.jsonl", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "not json\n{\"content\":\"ok\",\"is_user\":true,\"timestamp\":\"2026-01-01T00:00:00Z\"}\n",
        )
        .unwrap();
        let store = HistoryStore::with_path(path.clone());
        assert_eq!(store.len(), 1);
        assert_eq!(store.recent(1)[0].content, "ok");
        std::fs::remove_file(&path).unwrap();
    }
}
