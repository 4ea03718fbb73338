//! feni: the request gateway behind a local offline AI chat client.
//!
//! The UI layer is an external collaborator. It hands
//! [`InferenceGateway::submit`] a `(text, attachments)` pair and gets back a
//! sanitized, rate-limited result; conversation history and settings are
//! exposed through [`HistoryStore`] and [`SettingsStore`]. The inference
//! server itself (an Ollama-style process on loopback HTTP) is an opaque
//! black box reached only through [`SecureTransport`].
//!
//! This crate installs no tracing subscriber; the host application owns that.

pub mod config;
pub mod models;
pub mod services;
pub mod transport;
pub mod wire;

pub use models::{Attachment, AttachmentKind, HistoryEntry};
pub use services::attachments::{AttachmentError, AttachmentProcessor};
pub use services::gateway::{ErrorKind, InferenceGateway, InferenceResult};
pub use services::history::HistoryStore;
pub use services::settings::SettingsStore;
pub use transport::{InferenceTransport, SecureTransport, TransportError};
