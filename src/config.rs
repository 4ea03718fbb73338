//! Application constants shared across the gateway.

use std::time::Duration;

pub const APP_DIR: &str = "feni";
pub const USER_AGENT: &str = "Feni.AI/1.0";

/// Base address of the local inference server. Fixed to loopback; the
/// transport's trust policy refuses anything else.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const GENERATE_ENDPOINT: &str = "/api/generate";

/// Overall reqwest client timeout.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(3 * 60);
/// Per-call cancellation deadline, enforced independently of the client
/// timeout.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(2 * 60);

pub const MAX_REQUESTS_PER_MINUTE: u32 = 20;
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

pub const MAX_INPUT_LENGTH: usize = 4000;
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_DOCUMENT_LENGTH: usize = 20_000;
pub const MAX_ATTACHED_FILES: usize = 10;
pub const MAX_HISTORY: usize = 1000;

pub const DOCUMENT_TRUNCATION_MARKER: &str = "\n\n[Document truncated for processing...]";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "txt", "md", "cs", "py", "js", "html", "css", "json", "xml",
];

pub const MODEL_GENERAL: &str = "llama3.2:3B";
pub const MODEL_VISION: &str = "llava:7b";
pub const MODEL_CODE: &str = "codellama:7b";
