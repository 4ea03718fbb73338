//! Submission orchestration.
//!
//! `submit` is the single public entry point the UI calls. It runs the whole
//! pipeline: input sanitizer, rate limiter, prompt builder, wire codec,
//! transport, output sanitizer, history log. Only user-safe messages leave
//! this boundary; raw transport and codec errors are logged here and go no
//! further.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::config;
use crate::models::{Attachment, HistoryEntry};
use crate::services::history::HistoryStore;
use crate::services::rate_limit::RateLimiter;
use crate::services::{prompt, sanitize};
use crate::transport::{InferenceTransport, TransportError};
use crate::wire::{self, GenerationOptions, InferenceRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    Busy,
    TransportTimeout,
    TransportRefused,
    TransportHttpError,
    MalformedResponse,
    AttachmentTooLarge,
    AttachmentUnsupportedType,
    AttachmentNotFound,
    TooManyAttachments,
    UntrustedEndpoint,
    FilesystemError,
}

impl ErrorKind {
    /// The caller-facing wording for this failure. Deliberately generic;
    /// anything diagnostic belongs in the log, not in the chat window.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.",
            ErrorKind::Busy => "A request is already in progress.",
            ErrorKind::TransportTimeout => {
                "Request timed out. The operation took too long to complete."
            }
            ErrorKind::TransportRefused => "Cannot connect to Ollama. Is it running?",
            ErrorKind::TransportHttpError => {
                "The AI service rejected the request. Please ensure Ollama is running."
            }
            ErrorKind::MalformedResponse => "Invalid response format.",
            ErrorKind::AttachmentTooLarge => "File too large. Maximum size is 10MB.",
            ErrorKind::AttachmentUnsupportedType => "Unsupported file type.",
            ErrorKind::AttachmentNotFound => "File not found.",
            ErrorKind::TooManyAttachments => "Maximum 10 files allowed.",
            ErrorKind::UntrustedEndpoint => "Request blocked: untrusted server address.",
            ErrorKind::FilesystemError => "An error occurred while processing your request.",
        }
    }
}

impl From<&TransportError> for ErrorKind {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout => ErrorKind::TransportTimeout,
            TransportError::ConnectionRefused(_) => ErrorKind::TransportRefused,
            TransportError::HttpStatus { .. } => ErrorKind::TransportHttpError,
            TransportError::UntrustedHost(_) => ErrorKind::UntrustedEndpoint,
            TransportError::Unknown(_) => ErrorKind::FilesystemError,
        }
    }
}

impl From<&crate::services::attachments::AttachmentError> for ErrorKind {
    fn from(err: &crate::services::attachments::AttachmentError) -> Self {
        use crate::services::attachments::AttachmentError;
        match err {
            AttachmentError::NotFound(_) => ErrorKind::AttachmentNotFound,
            AttachmentError::TooLarge { .. } => ErrorKind::AttachmentTooLarge,
            AttachmentError::UnsupportedType(_) => ErrorKind::AttachmentUnsupportedType,
            AttachmentError::Io(_) => ErrorKind::FilesystemError,
        }
    }
}

/// Outcome of one submission, from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceResult {
    Success { content: String },
    Failure { reason: ErrorKind, detail: String },
}

impl InferenceResult {
    fn failure(reason: ErrorKind) -> Self {
        InferenceResult::Failure {
            reason,
            detail: reason.user_message().to_string(),
        }
    }
}

/// Model routing. Vision and code models exist as routing candidates; the
/// general model is selected unconditionally for now.
pub fn determine_model() -> &'static str {
    config::MODEL_GENERAL
}

pub struct InferenceGateway {
    transport: Arc<dyn InferenceTransport>,
    history: Arc<HistoryStore>,
    limiter: RateLimiter,
    // Single-slot guard: at most one in-flight submission. Contention is
    // reported as Busy, never queued.
    busy: Semaphore,
    model: String,
    options: GenerationOptions,
}

impl InferenceGateway {
    pub fn new(transport: Arc<dyn InferenceTransport>, history: Arc<HistoryStore>) -> Self {
        Self {
            transport,
            history,
            limiter: RateLimiter::default(),
            busy: Semaphore::new(1),
            model: determine_model().to_string(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a submission is currently in flight.
    pub fn is_processing(&self) -> bool {
        self.busy.available_permits() == 0
    }

    /// Run one full submission cycle.
    ///
    /// Returns `None` when the sanitized input is empty (a silent no-op, not
    /// an error). All failures carry a user-safe message only.
    pub async fn submit(
        &self,
        message: &str,
        attachments: &[Attachment],
    ) -> Option<InferenceResult> {
        // Acquired before any network I/O, released on every exit path when
        // the permit drops.
        let _permit = match self.busy.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("submission refused: another request is in flight");
                return Some(InferenceResult::failure(ErrorKind::Busy));
            }
        };

        let text = sanitize::sanitize_input(message);
        if text.is_empty() {
            debug!("ignoring submission with empty sanitized input");
            return None;
        }

        if attachments.len() > config::MAX_ATTACHED_FILES {
            warn!(count = attachments.len(), "submission refused: too many attachments");
            return Some(InferenceResult::failure(ErrorKind::TooManyAttachments));
        }

        if !self.limiter.allow() {
            warn!("submission refused: rate limit exceeded");
            return Some(InferenceResult::failure(ErrorKind::RateLimited));
        }

        self.history.append(text.clone(), true);

        let prompt = prompt::build_prompt(&text, attachments);
        let request = InferenceRequest::new(self.model.as_str(), prompt, self.options.clone());
        let body = match wire::encode_request(&request) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "failed to encode inference request");
                return Some(InferenceResult::failure(ErrorKind::MalformedResponse));
            }
        };

        let raw = match self
            .transport
            .post(config::GENERATE_ENDPOINT, body, config::REQUEST_DEADLINE)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "inference request failed");
                return Some(InferenceResult::failure(ErrorKind::from(&e)));
            }
        };

        let content = match wire::decode_response(&raw) {
            Ok(content) => content,
            Err(e) => {
                error!(error = %e, "could not decode inference response");
                return Some(InferenceResult::failure(ErrorKind::MalformedResponse));
            }
        };

        let content = sanitize::sanitize_output(&content);
        self.history.append(content.clone(), false);
        debug!(chars = content.len(), "submission completed");

        Some(InferenceResult::Success { content })
    }

    pub fn recent_history(&self, n: usize) -> Vec<HistoryEntry> {
        self.history.recent(n)
    }

    pub fn clear_history(&self) {
        self.history.clear()
    }
}
