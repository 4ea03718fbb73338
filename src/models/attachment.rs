use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    Image,
    Document,
}

/// A validated, normalized in-memory copy of a user-selected file, scoped to
/// one submission. Immutable once created; documents never persist beyond the
/// request that consumed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub kind: AttachmentKind,
    /// Base64-encoded bytes for images, (possibly truncated) text for
    /// documents. Image content is never forwarded on the text wire path;
    /// it exists as the multimodal extension point.
    pub content: String,
    pub size_bytes: u64,
    pub processed_at: DateTime<Utc>,
}

impl Attachment {
    pub fn is_document(&self) -> bool {
        self.kind == AttachmentKind::Document
    }
}
