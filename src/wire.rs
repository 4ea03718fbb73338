//! Wire codec for the `/api/generate` endpoint.
//!
//! The request body is a minimal JSON object with exactly `model`, `prompt`,
//! `stream: false` and a nested `options` object. The response body is
//! treated as a partially-trusted grammar: anything is accepted as long as it
//! carries a string `response` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response payload is missing a usable `response` field")]
    MalformedResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// Transient per-call request. Built, encoded, and discarded; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    pub model: String,
    pub prompt: String,
    stream: bool,
    pub options: GenerationOptions,
}

impl InferenceRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            // The gateway exposes no partial-response streaming.
            stream: false,
            options,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub fn encode_request(request: &InferenceRequest) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(request)
}

/// Extract the `response` string from a server reply. Unknown fields are
/// ignored; a missing or non-string `response` is a decode failure.
pub fn decode_response(body: &[u8]) -> Result<String, DecodeError> {
    serde_json::from_slice::<GenerateResponse>(body)
        .map(|r| r.response)
        .map_err(|_| DecodeError::MalformedResponse)
}
