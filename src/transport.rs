//! HTTP transport restricted to the local inference server.
//!
//! The client is constructed once, pinned to a loopback base address, and
//! refuses any request whose target host fails the trust policy. No retries
//! happen here; one submission is one attempt.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request deadline elapsed")]
    Timeout,
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    #[error("HTTP {code}: {reason}")]
    HttpStatus { code: u16, reason: String },
    #[error("refusing request to untrusted host: {0}")]
    UntrustedHost(String),
    #[error("transport failure: {0}")]
    Unknown(String),
}

/// Connection-trust decision keyed on the request's target host. Pluggable so
/// it can be unit-tested apart from any real socket.
pub type TrustPolicy = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Hard-coded same-host pinning: `localhost` and nothing else.
pub fn localhost_only(host: &str) -> bool {
    host == "localhost"
}

#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// POST `body` to `path` under the fixed base address. The deadline is
    /// enforced per call, independently of any client-wide timeout.
    async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        deadline: Duration,
    ) -> Result<Vec<u8>, TransportError>;
}

pub struct SecureTransport {
    client: Client,
    base_url: Url,
    trust: TrustPolicy,
}

impl SecureTransport {
    pub fn new() -> Result<Self> {
        Self::with_trust_policy(Box::new(localhost_only))
    }

    pub fn with_trust_policy(trust: TrustPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(config::CLIENT_TIMEOUT)
            .user_agent(config::USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        let base_url = Url::parse(config::OLLAMA_BASE_URL)
            .context("invalid inference server base address")?;
        Ok(Self {
            client,
            base_url,
            trust,
        })
    }

    fn target(&self, path: &str) -> Result<Url, TransportError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::Unknown(e.to_string()))?;
        let host = url.host_str().unwrap_or_default();
        if !(self.trust)(host) {
            warn!(host, "trust policy rejected request target");
            return Err(TransportError::UntrustedHost(host.to_string()));
        }
        Ok(url)
    }
}

#[async_trait]
impl InferenceTransport for SecureTransport {
    async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        deadline: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.target(path)?;
        debug!(%url, bytes = body.len(), "dispatching inference request");

        let call = async {
            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .map_err(classify_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::HttpStatus {
                    code: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("unknown").to_string(),
                });
            }

            let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
            Ok(bytes.to_vec())
        };

        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::ConnectionRefused(err.to_string())
    } else {
        TransportError::Unknown(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localhost_only_policy() {
        assert!(localhost_only("localhost"));
        assert!(!localhost_only("127.0.0.1"));
        assert!(!localhost_only("example.com"));
        assert!(!localhost_only(""));
    }

    #[test]
    fn test_untrusted_host_is_rejected_before_dispatch() {
        // Policy that trusts nothing: even the pinned loopback base address
        // must be refused, not warned about.
        let transport = SecureTransport::with_trust_policy(Box::new(|_| false)).unwrap();
        let err = transport.target(config::GENERATE_ENDPOINT).unwrap_err();
        assert!(matches!(err, TransportError::UntrustedHost(h) if h == "localhost"));
    }

    #[test]
    fn test_default_policy_trusts_pinned_base() {
        let transport = SecureTransport::new().unwrap();
        let url = transport.target(config::GENERATE_ENDPOINT).unwrap();
        assert_eq!(url.as_str(), "http://localhost:11434/api/generate");
    }
}
