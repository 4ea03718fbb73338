use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One side of an exchange, as recorded by the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(content: impl Into<String>, is_user: bool) -> Self {
        Self {
            content: content.into(),
            is_user,
            timestamp: Utc::now(),
        }
    }
}
