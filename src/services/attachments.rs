//! Validation and normalization of user-selected files.
//!
//! Every source file is copied to a freshly named scratch path before being
//! read, so later manipulation of the original cannot race the read. The
//! scratch copy is removed on every exit path, including errors and panics.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{
    DOCUMENT_EXTENSIONS, DOCUMENT_TRUNCATION_MARKER, IMAGE_EXTENSIONS, MAX_DOCUMENT_LENGTH,
    MAX_FILE_SIZE_BYTES,
};
use crate::models::{Attachment, AttachmentKind};

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
    #[error("unsupported file type: .{0}")]
    UnsupportedType(String),
    #[error("failed to process file: {0}")]
    Io(#[from] std::io::Error),
}

pub struct AttachmentProcessor {
    scratch_dir: PathBuf,
}

impl AttachmentProcessor {
    pub fn new() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn with_scratch_dir(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Validate and read one source file into an [`Attachment`].
    ///
    /// Checks run fail-fast in a fixed order: existence, size, extension.
    /// Concurrent calls are safe for distinct paths; each call gets its own
    /// randomly named scratch copy.
    pub async fn process(
        &self,
        path: &Path,
        kind: AttachmentKind,
    ) -> Result<Attachment, AttachmentError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|_| AttachmentError::NotFound(path.to_path_buf()))?;
        if !meta.is_file() {
            return Err(AttachmentError::NotFound(path.to_path_buf()));
        }

        if meta.len() > MAX_FILE_SIZE_BYTES {
            return Err(AttachmentError::TooLarge {
                size: meta.len(),
                limit: MAX_FILE_SIZE_BYTES,
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let allowed = match kind {
            AttachmentKind::Image => IMAGE_EXTENSIONS,
            AttachmentKind::Document => DOCUMENT_EXTENSIONS,
        };
        if !allowed.contains(&extension.as_str()) {
            return Err(AttachmentError::UnsupportedType(extension));
        }

        let scratch = ScratchCopy::create(&self.scratch_dir, path).await?;
        debug!(source = %path.display(), scratch = %scratch.path().display(), "processing attachment");

        let data = tokio::fs::read(scratch.path()).await?;
        let content = match kind {
            AttachmentKind::Image => BASE64.encode(&data),
            AttachmentKind::Document => normalize_document(&data),
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Attachment {
            file_name,
            kind,
            content,
            size_bytes: meta.len(),
            processed_at: Utc::now(),
        })
    }
}

impl Default for AttachmentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_document(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    if text.chars().count() <= MAX_DOCUMENT_LENGTH {
        return text.into_owned();
    }
    let mut truncated: String = text.chars().take(MAX_DOCUMENT_LENGTH).collect();
    truncated.push_str(DOCUMENT_TRUNCATION_MARKER);
    truncated
}

/// A randomly named copy of the source file, deleted when dropped.
struct ScratchCopy {
    path: PathBuf,
}

impl ScratchCopy {
    async fn create(dir: &Path, source: &Path) -> std::io::Result<Self> {
        // The guard exists before the copy so a partial copy is cleaned too.
        let guard = Self {
            path: dir.join(format!("feni-{}", Uuid::new_v4())),
        };
        tokio::fs::copy(source, &guard.path).await?;
        Ok(guard)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchCopy {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove scratch copy");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("feni-test-{tag}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn scratch_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = scratch_root("missing");
        let processor = AttachmentProcessor::with_scratch_dir(&dir);
        let result = processor
            .process(&dir.join("nope.txt"), AttachmentKind::Document)
            .await;
        assert!(matches!(result, Err(AttachmentError::NotFound(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let dir = scratch_root("oversize");
        let source = dir.join("big.txt");
        std::fs::write(&source, vec![b'a'; MAX_FILE_SIZE_BYTES as usize + 1]).unwrap();

        let processor = AttachmentProcessor::with_scratch_dir(&dir);
        let result = processor.process(&source, AttachmentKind::Document).await;
        assert!(matches!(
            result,
            Err(AttachmentError::TooLarge { size, .. }) if size == MAX_FILE_SIZE_BYTES + 1
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_extension_allow_list_per_kind() {
        let dir = scratch_root("ext");
        let exe = dir.join("tool.exe");
        std::fs::write(&exe, b"MZ").unwrap();

        let processor = AttachmentProcessor::with_scratch_dir(&dir);
        let result = processor.process(&exe, AttachmentKind::Document).await;
        assert!(matches!(result, Err(AttachmentError::UnsupportedType(ext)) if ext == "exe"));

        // A document extension passed as an image is just as unsupported.
        let txt = dir.join("notes.txt");
        std::fs::write(&txt, b"hello").unwrap();
        let result = processor.process(&txt, AttachmentKind::Image).await;
        assert!(matches!(result, Err(AttachmentError::UnsupportedType(ext)) if ext == "txt"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_image_is_base64_encoded() {
        let dir = scratch_root("image");
        let source = dir.join("pixel.png");
        std::fs::write(&source, [0x89, b'P', b'N', b'G']).unwrap();

        let processor = AttachmentProcessor::with_scratch_dir(&dir);
        let attachment = processor
            .process(&source, AttachmentKind::Image)
            .await
            .unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Image);
        assert_eq!(attachment.file_name, "pixel.png");
        assert_eq!(attachment.size_bytes, 4);
        assert_eq!(BASE64.decode(&attachment.content).unwrap(), [0x89, b'P', b'N', b'G']);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_long_document_is_truncated_with_marker() {
        let dir = scratch_root("truncate");
        let source = dir.join("long.md");
        std::fs::write(&source, "z".repeat(MAX_DOCUMENT_LENGTH + 500)).unwrap();

        let processor = AttachmentProcessor::with_scratch_dir(&dir);
        let attachment = processor
            .process(&source, AttachmentKind::Document)
            .await
            .unwrap();
        assert!(attachment.content.ends_with(DOCUMENT_TRUNCATION_MARKER));
        assert_eq!(
            attachment.content.chars().count(),
            MAX_DOCUMENT_LENGTH + DOCUMENT_TRUNCATION_MARKER.chars().count()
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_scratch_copy_removed_on_success_and_failure() {
        let scratch = scratch_root("cleanup-scratch");
        let sources = scratch_root("cleanup-src");
        let processor = AttachmentProcessor::with_scratch_dir(&scratch);

        let good = sources.join("ok.txt");
        std::fs::write(&good, b"fine").unwrap();
        processor
            .process(&good, AttachmentKind::Document)
            .await
            .unwrap();
        assert!(scratch_is_empty(&scratch));

        // Failure after validation (unreadable copy source) leaves no scratch
        // file either: the rejected .exe never reaches the copy stage, and a
        // vanished source fails before it as NotFound.
        let bad = sources.join("gone.txt");
        std::fs::write(&bad, b"x").unwrap();
        std::fs::remove_file(&bad).unwrap();
        let _ = processor.process(&bad, AttachmentKind::Document).await;
        assert!(scratch_is_empty(&scratch));

        std::fs::remove_dir_all(&scratch).unwrap();
        std::fs::remove_dir_all(&sources).unwrap();
    }
}
